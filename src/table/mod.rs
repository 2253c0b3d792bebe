//! # Pattern Tables
//!
//! A [`ConfigTable`] is the raw, row-oriented description of a document format:
//! which three names make up the hierarchy, which items live at each level and
//! which start/end markers delimit every item. The table is plain data; the
//! [`compiler`](crate::compiler) turns it into lookup structures.
//!
//! ```text
//! order,process,object,attribute
//! items
//! process,Doc
//! object,Person
//! attribute,Name
//! markers
//! Doc,<P>,</P>
//! Person,<Person>,</Person>
//! Name,<Name>,</Name>
//! ```
//!
//! Tables can be built in code with [`ConfigTable::from_rows`], parsed from the
//! comma separated form above with [`ConfigTable::parse_csv`], or read from a JSON
//! array of string arrays with [`ConfigTable::from_json`].

pub mod row;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tags recognised in the first cell of a section header row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum RowTag {
    /// `order,<process>,<object>,<attribute>`
    Order,
    /// Followed by `(level, item)` rows.
    Items,
    /// Followed by `(item, start marker, end marker)` rows.
    Markers,
}

impl RowTag {
    /// Returns the tag of `row` if its first cell is a section header.
    pub fn of(row: &[String]) -> Option<Self> {
        row.first()
            .and_then(|cell| RowTag::try_from(cell.trim()).ok())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigTable {
    rows: Vec<Vec<String>>,
}

impl ConfigTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows<R, S>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    pub fn push_row<S: Into<String>>(&mut self, row: impl IntoIterator<Item = S>) {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Parses the comma separated table format.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    #[tracing::instrument(level = "debug", skip(text))]
    pub fn parse_csv(text: &str) -> TableResult<Self> {
        let mut table = Self::new();
        for (index, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let cells = row::parse_row(line, index + 1)?;
            if cells.is_empty() {
                continue;
            }
            table.rows.push(cells);
        }
        tracing::debug!("parsed {} table rows", table.rows.len());
        Ok(table)
    }

    /// Parses a JSON array of string arrays.
    pub fn from_json(text: &str) -> TableResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads a table from disk. Files ending in `.json` are read as JSON,
    /// everything else as comma separated text.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> TableResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| TableError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&text)
        } else {
            Self::parse_csv(&text)
        }
    }
}

pub type TableResult<T> = Result<T, TableError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Failed to read pattern table {path}: {message}")]
    Io { path: String, message: String },
    #[error("Malformed table line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Malformed JSON table: {0}")]
    Json(String),
}

impl From<serde_json::Error> for TableError {
    fn from(e: serde_json::Error) -> Self {
        TableError::Json(e.to_string())
    }
}
