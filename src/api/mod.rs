//! Purpose: Define the public Rust API boundary for tabsort.
//! Exports: Table model, typed cell reads, bid projection, sort entry points, errors.
//! Role: Additive-only surface; hides the internal module layout.
//! Invariants: This module is the only public path to core types.

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::cell::{ConversionMode, FromCell};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::record::{
    Bid, CURRENCY_SYMBOL, ColumnMapping, load_bids, load_bids_with, parse_currency,
    parse_currency_lenient,
};
pub use crate::core::table::{
    DEFAULT_SEPARATOR, DuplicateHeaders, Header, ParseOptions, Row, RowHandle, Source, Table,
};

/// Sort entry points over bid sequences.
pub mod sort {
    pub use crate::core::sort::{
        Algorithm, SortKey, SortStats, is_sorted_by, quick_sort, quick_sort_all,
        quick_sort_all_by, quick_sort_by, selection_sort, selection_sort_by_fund,
        selection_sort_by_id, selection_sort_by_title, sort_records,
    };
}
