//! PriceSeries: the in-memory table every source normalizes into.
//!
//! A series is a row index (positional or dated) plus an ordered list of
//! named columns. Cells are optional so partially-populated files and
//! provider gaps survive ingestion without being coerced to zero.

use crate::data::dates::parse_datetime;
use crate::data::DataError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Canonical price fields, in the order sources are checked for them.
pub const PRICE_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// Column promoted to the row index when present.
pub const DATE_COLUMN: &str = "date";

/// Column written by return calculation.
pub const RETURN_COLUMN: &str = "return";

/// Cells of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match self {
            ColumnData::Numeric(v) => Some(v),
            ColumnData::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&[Option<String>]> {
        match self {
            ColumnData::Text(v) => Some(v),
            ColumnData::Numeric(_) => None,
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Text(values),
        }
    }
}

/// Row index of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum RowIndex {
    /// `0..n`, used until a date column is promoted.
    Positional(usize),
    /// One timestamp per row, ascending as delivered by the source. Rows
    /// whose date cell was empty carry `None`.
    Dates(Vec<Option<NaiveDateTime>>),
}

impl RowIndex {
    pub fn len(&self) -> usize {
        match self {
            RowIndex::Positional(n) => *n,
            RowIndex::Dates(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Dated (or positionally indexed) table of prices for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeriesParts")]
pub struct PriceSeries {
    index: RowIndex,
    columns: Vec<Column>,
}

/// Unchecked wire form; deserialization goes through [`PriceSeries::new`].
#[derive(Deserialize)]
struct SeriesParts {
    index: RowIndex,
    columns: Vec<Column>,
}

impl TryFrom<SeriesParts> for PriceSeries {
    type Error = DataError;

    fn try_from(parts: SeriesParts) -> Result<Self, Self::Error> {
        Self::new(parts.index, parts.columns)
    }
}

impl PriceSeries {
    /// Build a series, checking that every column matches the index length
    /// and that column names are unique.
    pub fn new(index: RowIndex, columns: Vec<Column>) -> Result<Self, DataError> {
        let rows = index.len();
        for (i, column) in columns.iter().enumerate() {
            if column.data.len() != rows {
                return Err(DataError::ShapeMismatch(format!(
                    "column '{}' has {} cells, index has {rows} rows",
                    column.name,
                    column.data.len()
                )));
            }
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(DataError::ShapeMismatch(format!(
                    "duplicate column '{}'",
                    column.name
                )));
            }
        }
        Ok(Self { index, columns })
    }

    /// Build a positionally indexed series; the row count comes from the
    /// first column (zero when there are no columns).
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, DataError> {
        let rows = columns.first().map(|c| c.data.len()).unwrap_or(0);
        Self::new(RowIndex::Positional(rows), columns)
    }

    /// Build a dated series.
    pub fn with_dates(dates: Vec<NaiveDateTime>, columns: Vec<Column>) -> Result<Self, DataError> {
        Self::new(RowIndex::Dates(dates.into_iter().map(Some).collect()), columns)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &RowIndex {
        &self.index
    }

    /// Row timestamps, if the series has a date index.
    pub fn dates(&self) -> Option<&[Option<NaiveDateTime>]> {
        match &self.index {
            RowIndex::Dates(d) => Some(d),
            RowIndex::Positional(_) => None,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Cells of a numeric column; `None` if absent or textual.
    pub fn numeric(&self, name: &str) -> Option<&[Option<f64>]> {
        self.column(name).and_then(|c| c.data.as_numeric())
    }

    pub fn close(&self) -> Option<&[Option<f64>]> {
        self.numeric("close")
    }

    pub fn returns(&self) -> Option<&[Option<f64>]> {
        self.numeric(RETURN_COLUMN)
    }

    /// Canonical price fields this series does not carry.
    pub fn missing_price_columns(&self) -> Vec<&'static str> {
        PRICE_COLUMNS
            .iter()
            .copied()
            .filter(|name| !self.has_column(name))
            .collect()
    }

    /// Rename columns according to `(from, to)` pairs. Names not present are
    /// ignored, and a rename onto a name another column already uses is
    /// skipped so names stay unique.
    pub fn rename_columns(&mut self, mapping: &[(&str, &str)]) {
        for (from, to) in mapping {
            if from == to || self.has_column(to) {
                if from != to && self.has_column(from) {
                    tracing::warn!(from, to, "column rename skipped: target name already present");
                }
                continue;
            }
            if let Some(column) = self.columns.iter_mut().find(|c| c.name == *from) {
                column.name = (*to).to_string();
            }
        }
    }

    /// Insert a column, replacing any existing column of the same name in place.
    pub fn set_column(&mut self, column: Column) -> Result<(), DataError> {
        if column.data.len() != self.len() {
            return Err(DataError::ShapeMismatch(format!(
                "column '{}' has {} cells, index has {} rows",
                column.name,
                column.data.len(),
                self.len()
            )));
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Remove and return a column.
    pub fn take_column(&mut self, name: &str) -> Option<Column> {
        let pos = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(pos))
    }

    /// Parse the `date` column and make it the row index.
    ///
    /// Returns `Ok(false)` when the series has no `date` column. Empty cells
    /// become `None` index entries; a cell that is present but does not parse
    /// is an error and leaves the series unchanged.
    pub fn promote_date_index(&mut self) -> Result<bool, DataError> {
        let Some(column) = self.column(DATE_COLUMN) else {
            return Ok(false);
        };

        let dates = match &column.data {
            ColumnData::Text(cells) => cells
                .iter()
                .enumerate()
                .map(|(row, cell)| match cell.as_deref() {
                    None => Ok(None),
                    Some(raw) => parse_datetime(raw)
                        .map(Some)
                        .ok_or_else(|| invalid_date(row, raw)),
                })
                .collect::<Result<Vec<_>, _>>()?,
            ColumnData::Numeric(cells) => cells
                .iter()
                .enumerate()
                .map(|(row, cell)| {
                    let Some(v) = *cell else {
                        return Ok(None);
                    };
                    // Compact dates such as 20240102 come through as numbers.
                    let raw = if v.fract() == 0.0 {
                        format!("{}", v as i64)
                    } else {
                        v.to_string()
                    };
                    parse_datetime(&raw)
                        .map(Some)
                        .ok_or_else(|| invalid_date(row, &raw))
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        self.take_column(DATE_COLUMN);
        self.index = RowIndex::Dates(dates);
        Ok(true)
    }
}

fn invalid_date(row: usize, value: &str) -> DataError {
    DataError::InvalidDate {
        row,
        value: value.to_string(),
    }
}
