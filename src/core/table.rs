// Delimited-text tables: header + rows with positional, named, and typed access.
// Lines are split on a single separator character; quoting is not interpreted.
// Row identity is positional, so structural edits bump a generation counter
// that invalidates previously issued row handles.
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bstr::ByteSlice;

use crate::core::cell::{self, ConversionMode, FromCell};
use crate::core::error::{Error, ErrorKind, index_error};

pub const DEFAULT_SEPARATOR: char = ',';

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Source {
    File(PathBuf),
    Text(String),
}

impl Source {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Source::File(path.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Source::Text(text.into())
    }
}

/// What to do when the header names the same column twice.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DuplicateHeaders {
    /// Keep every column; name lookups resolve to the first match.
    #[default]
    FirstMatch,
    /// Fail the parse.
    Reject,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ParseOptions {
    pub separator: char,
    pub duplicate_headers: DuplicateHeaders,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            duplicate_headers: DuplicateHeaders::default(),
        }
    }
}

impl ParseOptions {
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_duplicate_headers(mut self, policy: DuplicateHeaders) -> Self {
        self.duplicate_headers = policy;
        self
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Header {
    names: Vec<String>,
}

impl Header {
    fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn get(&self, pos: usize) -> Option<&str> {
        self.names.get(pos).map(String::as_str)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|candidate| candidate == name)
    }

    fn first_duplicate(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.names
            .iter()
            .find(|name| !seen.insert(name.as_str()))
            .map(String::as_str)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    header: Arc<Header>,
    values: Vec<String>,
}

impl Row {
    fn new(header: Arc<Header>, values: Vec<String>) -> Self {
        Self { header, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn get(&self, pos: usize) -> Result<&str, Error> {
        self.values
            .get(pos)
            .map(String::as_str)
            .ok_or_else(|| index_error("column", pos, self.values.len()))
    }

    pub fn get_named(&self, name: &str) -> Result<&str, Error> {
        let pos = self.resolve(name)?;
        self.get(pos)
    }

    /// Strict typed read of the cell at `pos`.
    pub fn value<T: FromCell>(&self, pos: usize) -> Result<T, Error> {
        self.value_with(pos, ConversionMode::Strict)
    }

    pub fn value_with<T: FromCell>(&self, pos: usize, mode: ConversionMode) -> Result<T, Error> {
        let text = self.get(pos)?;
        cell::convert(text, mode).map_err(|err| err.with_column(pos))
    }

    pub fn value_named<T: FromCell>(&self, name: &str) -> Result<T, Error> {
        let pos = self.resolve(name)?;
        self.value(pos)
    }

    pub fn push(&mut self, value: impl Into<String>) {
        self.values.push(value.into());
    }

    pub fn set_at(&mut self, pos: usize, value: impl Into<String>) -> Result<(), Error> {
        let len = self.values.len();
        let slot = self
            .values
            .get_mut(pos)
            .ok_or_else(|| index_error("column", pos, len))?;
        *slot = value.into();
        Ok(())
    }

    /// Overwrite the cell under `name`, padding a short row up to that column.
    /// Returns false when the header has no such column.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        let Some(pos) = self.header.position(name) else {
            return false;
        };
        if pos >= self.values.len() {
            self.values.resize(pos, String::new());
            self.values.push(value.into());
        } else {
            self.values[pos] = value.into();
        }
        true
    }

    pub fn join(&self, separator: char) -> String {
        let mut buf = [0u8; 4];
        self.values.join(&*separator.encode_utf8(&mut buf))
    }

    fn resolve(&self, name: &str) -> Result<usize, Error> {
        self.header.position(name).ok_or_else(|| {
            Error::new(ErrorKind::Index).with_message(format!("unknown column {name:?}"))
        })
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join(DEFAULT_SEPARATOR))
    }
}

/// Position of a row as of a given table generation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RowHandle {
    index: usize,
    generation: u64,
}

impl RowHandle {
    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Debug)]
pub struct Table {
    file: Option<PathBuf>,
    separator: char,
    header: Arc<Header>,
    rows: Vec<Row>,
    raw_lines: Vec<String>,
    generation: u64,
}

impl Table {
    pub fn parse(source: Source, options: ParseOptions) -> Result<Self, Error> {
        let (file, raw_lines) = match source {
            Source::File(path) => {
                let bytes = fs::read(&path).map_err(|err| {
                    Error::new(ErrorKind::Parse)
                        .with_message("failed to read table source")
                        .with_path(&path)
                        .with_source(err)
                })?;
                let lines = split_lines(&bytes);
                (Some(path), lines)
            }
            Source::Text(text) => (None, split_lines(text.as_bytes())),
        };

        let mut lines = raw_lines.iter().filter(|line| !line.is_empty());
        let header_line = lines.next().ok_or_else(|| {
            let err = Error::new(ErrorKind::Parse).with_message("missing header line");
            match &file {
                Some(path) => err.with_path(path),
                None => err,
            }
        })?;
        let header = Header::new(split_cells(header_line, options.separator));
        if options.duplicate_headers == DuplicateHeaders::Reject {
            if let Some(name) = header.first_duplicate() {
                return Err(Error::new(ErrorKind::Parse)
                    .with_message(format!("duplicate header column {name:?}")));
            }
        }
        let header = Arc::new(header);

        let rows = lines
            .map(|line| Row::new(Arc::clone(&header), split_cells(line, options.separator)))
            .collect();

        Ok(Self {
            file,
            separator: options.separator,
            header,
            rows,
            raw_lines,
            generation: 0,
        })
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, Error> {
        Self::parse(Source::file(path), ParseOptions::default())
    }

    pub fn from_text(text: impl Into<String>) -> Result<Self, Error> {
        Self::parse(Source::text(text), ParseOptions::default())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn header(&self) -> &[String] {
        self.header.names()
    }

    pub fn header_element(&self, pos: usize) -> Result<&str, Error> {
        self.header
            .get(pos)
            .ok_or_else(|| index_error("header", pos, self.header.len()))
    }

    pub fn file_name(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn raw_lines(&self) -> &[String] {
        &self.raw_lines
    }

    pub fn row(&self, index: usize) -> Result<&Row, Error> {
        self.rows
            .get(index)
            .ok_or_else(|| index_error("row", index, self.rows.len()))
    }

    pub fn row_mut(&mut self, index: usize) -> Result<&mut Row, Error> {
        let len = self.rows.len();
        self.rows
            .get_mut(index)
            .ok_or_else(|| index_error("row", index, len))
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = &Row> {
        self.rows.iter()
    }

    pub fn delete_row(&mut self, index: usize) -> bool {
        if index >= self.rows.len() {
            return false;
        }
        self.rows.remove(index);
        self.generation += 1;
        true
    }

    /// Insert a row built from `values` at `index`; `index == row_count()` appends.
    /// Row width is not checked against the header.
    pub fn add_row<S: Into<String>>(&mut self, index: usize, values: impl IntoIterator<Item = S>) -> bool {
        if index > self.rows.len() {
            return false;
        }
        let values = values.into_iter().map(Into::into).collect();
        self.rows.insert(index, Row::new(Arc::clone(&self.header), values));
        self.generation += 1;
        true
    }

    pub fn handle(&self, index: usize) -> Result<RowHandle, Error> {
        self.row(index)?;
        Ok(RowHandle {
            index,
            generation: self.generation,
        })
    }

    pub fn resolve(&self, handle: &RowHandle) -> Result<&Row, Error> {
        self.check_handle(handle)?;
        self.row(handle.index)
    }

    pub fn resolve_mut(&mut self, handle: &RowHandle) -> Result<&mut Row, Error> {
        self.check_handle(handle)?;
        self.row_mut(handle.index)
    }

    fn check_handle(&self, handle: &RowHandle) -> Result<(), Error> {
        if handle.generation != self.generation {
            return Err(Error::new(ErrorKind::Index)
                .with_message("stale row handle (table changed shape)")
                .with_row(handle.index));
        }
        Ok(())
    }

    /// Header and rows joined by the table separator, newline-terminated.
    pub fn render(&self) -> String {
        let mut buf = [0u8; 4];
        let separator = &*self.separator.encode_utf8(&mut buf);
        let mut out = self.header.names().join(separator);
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.join(self.separator));
            out.push('\n');
        }
        out
    }

    /// Overwrite the source file with the current header and rows.
    pub fn sync(&self) -> Result<(), Error> {
        let path = self.file.as_ref().ok_or_else(|| {
            Error::new(ErrorKind::Usage).with_message("table was parsed from text; nothing to sync")
        })?;
        fs::write(path, self.render()).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to write table")
                .with_path(path)
                .with_source(err)
        })
    }
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    bytes
        .lines()
        .map(|line| line.to_str_lossy().into_owned())
        .collect()
}

fn split_cells(line: &str, separator: char) -> Vec<String> {
    line.split(separator).map(str::to_string).collect()
}
