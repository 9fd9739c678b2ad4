// Projection of table rows into bid records.
use std::fmt;

use serde::Serialize;

use crate::core::cell::{self, ConversionMode};
use crate::core::error::{Error, ErrorKind};
use crate::core::table::{Row, Table};

pub const CURRENCY_SYMBOL: char = '$';

/// Which column feeds each bid field. Defaults follow the monthly eBid sales export.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct ColumnMapping {
    pub title: usize,
    pub bid_id: usize,
    pub amount: usize,
    pub fund: usize,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            title: 0,
            bid_id: 1,
            amount: 4,
            fund: 8,
        }
    }
}

impl ColumnMapping {
    /// Parse `field=index` pairs separated by commas, e.g. `title=0,id=1`.
    /// Fields left out keep their default column.
    pub fn parse(spec: &str) -> Result<Self, Error> {
        let mut mapping = Self::default();
        for pair in spec.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
            let (field, index) = pair.split_once('=').ok_or_else(|| {
                Error::new(ErrorKind::Usage)
                    .with_message(format!("column mapping entry {pair:?} is not field=index"))
            })?;
            let index: usize = index.trim().parse().map_err(|_| {
                Error::new(ErrorKind::Usage)
                    .with_message(format!("column index {:?} is not a number", index.trim()))
            })?;
            let slot = match field.trim() {
                "title" => &mut mapping.title,
                "id" | "bid_id" => &mut mapping.bid_id,
                "amount" => &mut mapping.amount,
                "fund" => &mut mapping.fund,
                other => {
                    return Err(Error::new(ErrorKind::Usage)
                        .with_message(format!("unknown bid field {other:?}"))
                        .with_hint("Known fields: title, id, amount, fund."));
                }
            };
            *slot = index;
        }
        Ok(mapping)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bid {
    pub bid_id: String,
    pub title: String,
    pub fund: String,
    pub amount: f64,
}

impl Bid {
    /// Build a bid from user-entered text; the amount is read leniently.
    pub fn new(
        bid_id: impl Into<String>,
        title: impl Into<String>,
        fund: impl Into<String>,
        amount: &str,
    ) -> Self {
        Self {
            bid_id: bid_id.into(),
            title: title.into(),
            fund: fund.into(),
            amount: parse_currency_lenient(amount, CURRENCY_SYMBOL),
        }
    }

    pub fn from_row(row: &Row, mapping: &ColumnMapping) -> Result<Self, Error> {
        Self::from_row_with(row, mapping, ConversionMode::Strict)
    }

    /// Project `row`; in `Lenient` mode an unreadable amount becomes 0.0.
    /// Missing columns are `Index` errors in both modes.
    pub fn from_row_with(
        row: &Row,
        mapping: &ColumnMapping,
        mode: ConversionMode,
    ) -> Result<Self, Error> {
        let amount_text = row.get(mapping.amount)?;
        let amount = match mode {
            ConversionMode::Strict => parse_currency(amount_text, CURRENCY_SYMBOL)
                .map_err(|err| err.with_column(mapping.amount))?,
            ConversionMode::Lenient => parse_currency_lenient(amount_text, CURRENCY_SYMBOL),
        };
        Ok(Self {
            bid_id: row.get(mapping.bid_id)?.to_string(),
            title: row.get(mapping.title)?.to_string(),
            fund: row.get(mapping.fund)?.to_string(),
            amount,
        })
    }
}

impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} | {} | {}",
            self.bid_id, self.title, self.amount, self.fund
        )
    }
}

fn strip_currency(text: &str, symbol: char) -> String {
    text.chars()
        .filter(|&ch| ch != symbol && ch != ',')
        .collect()
}

/// Strip `symbol` and thousands separators, then parse strictly.
pub fn parse_currency(text: &str, symbol: char) -> Result<f64, Error> {
    cell::convert(&strip_currency(text, symbol), ConversionMode::Strict).map_err(|_| {
        Error::new(ErrorKind::Conversion).with_message(format!("cannot read {text:?} as an amount"))
    })
}

/// Like [`parse_currency`] but never fails: unreadable text becomes 0.0.
pub fn parse_currency_lenient(text: &str, symbol: char) -> f64 {
    cell::convert(&strip_currency(text, symbol), ConversionMode::Lenient).unwrap_or_default()
}

/// Project every table row through `mapping`, stopping at the first bad row.
pub fn load_bids(table: &Table, mapping: &ColumnMapping) -> Result<Vec<Bid>, Error> {
    load_bids_with(table, mapping, ConversionMode::Strict)
}

pub fn load_bids_with(
    table: &Table,
    mapping: &ColumnMapping,
    mode: ConversionMode,
) -> Result<Vec<Bid>, Error> {
    table
        .rows()
        .enumerate()
        .map(|(index, row)| {
            Bid::from_row_with(row, mapping, mode).map_err(|err| err.with_row(index))
        })
        .collect()
}
