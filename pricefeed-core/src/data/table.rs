//! Raw grid → PriceSeries.
//!
//! CSV and spreadsheet readers both produce a header row plus a grid of
//! loosely typed cells. This module infers column types, names unnamed
//! columns and promotes the `date` column.

use super::provider::DataError;
use crate::series::{Column, PriceSeries, RowIndex};

/// Markers read as a missing value.
const NA_VALUES: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A"];

/// A single cell as read from a source file.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Missing,
    Number(f64),
    Text(String),
}

impl RawCell {
    /// Classify a text cell, mapping NA markers to `Missing`.
    pub fn from_text(raw: &str) -> Self {
        if NA_VALUES.contains(&raw.trim()) {
            RawCell::Missing
        } else {
            RawCell::Text(raw.to_string())
        }
    }

    fn as_number(&self) -> Option<Option<f64>> {
        match self {
            RawCell::Missing => Some(None),
            RawCell::Number(v) if v.is_nan() => Some(None),
            RawCell::Number(v) => Some(Some(*v)),
            RawCell::Text(s) => s.trim().parse::<f64>().ok().map(|v| (!v.is_nan()).then_some(v)),
        }
    }

    fn into_text(self) -> Option<String> {
        match self {
            RawCell::Missing => None,
            RawCell::Number(v) => Some(v.to_string()),
            RawCell::Text(s) => Some(s),
        }
    }
}

/// Build a series from header names and rows of cells.
///
/// `headers` of `None` means the source had no header row; columns are then
/// named `column_0`, `column_1`, ... Short rows are padded with missing cells.
pub fn build_series(
    headers: Option<Vec<String>>,
    rows: Vec<Vec<RawCell>>,
) -> Result<PriceSeries, DataError> {
    let width = rows
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0)
        .max(headers.as_ref().map_or(0, Vec::len));

    let names = column_names(headers, width);
    let height = rows.len();

    let mut grid: Vec<Vec<RawCell>> = (0..width).map(|_| Vec::with_capacity(height)).collect();
    for row in rows {
        let mut cells = row.into_iter();
        for column in grid.iter_mut() {
            column.push(cells.next().unwrap_or(RawCell::Missing));
        }
    }

    let columns = names
        .into_iter()
        .zip(grid)
        .map(|(name, cells)| infer_column(name, cells))
        .collect();

    let mut series = PriceSeries::new(RowIndex::Positional(height), columns)?;
    series.promote_date_index()?;
    Ok(series)
}

fn infer_column(name: String, cells: Vec<RawCell>) -> Column {
    let numeric: Option<Vec<Option<f64>>> = cells.iter().map(RawCell::as_number).collect();
    match numeric {
        Some(values) => Column::numeric(name, values),
        None => Column::text(name, cells.into_iter().map(RawCell::into_text).collect()),
    }
}

/// Fill in blank header names and suffix duplicates (`close`, `close.1`).
fn column_names(headers: Option<Vec<String>>, width: usize) -> Vec<String> {
    let raw: Vec<String> = match headers {
        Some(h) => (0..width)
            .map(|i| {
                let name = h.get(i).map(|s| s.trim()).unwrap_or("");
                if name.is_empty() {
                    format!("column_{i}")
                } else {
                    name.to_string()
                }
            })
            .collect(),
        None => (0..width).map(|i| format!("column_{i}")).collect(),
    };

    let mut names: Vec<String> = Vec::with_capacity(raw.len());
    for name in raw {
        let mut candidate = name.clone();
        let mut n = 1;
        while names.contains(&candidate) {
            candidate = format!("{name}.{n}");
            n += 1;
        }
        names.push(candidate);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::ColumnData;

    fn text_row(cells: &[&str]) -> Vec<RawCell> {
        cells.iter().map(|c| RawCell::from_text(c)).collect()
    }

    #[test]
    fn numeric_columns_are_inferred() {
        let series = build_series(
            Some(vec!["close".into(), "note".into()]),
            vec![text_row(&["100.5", "ok"]), text_row(&["", "x"]), text_row(&["NaN", ""])],
        )
        .unwrap();
        assert_eq!(series.close().unwrap(), &[Some(100.5), None, None]);
        assert_eq!(
            series.column("note").unwrap().data,
            ColumnData::Text(vec![Some("ok".into()), Some("x".into()), None])
        );
    }

    #[test]
    fn mixed_column_falls_back_to_text() {
        let series = build_series(
            Some(vec!["volume".into()]),
            vec![vec![RawCell::Number(5.0)], text_row(&["n/a-ish"])],
        )
        .unwrap();
        assert_eq!(
            series.column("volume").unwrap().data,
            ColumnData::Text(vec![Some("5".into()), Some("n/a-ish".into())])
        );
    }

    #[test]
    fn headerless_columns_are_numbered_and_rows_padded() {
        let series = build_series(None, vec![text_row(&["1", "2"]), text_row(&["3"])]).unwrap();
        assert_eq!(series.column_names(), vec!["column_0", "column_1"]);
        assert_eq!(series.numeric("column_1").unwrap(), &[Some(2.0), None]);
    }

    #[test]
    fn duplicate_and_blank_headers_are_renamed() {
        let series = build_series(
            Some(vec!["close".into(), "close".into(), " ".into()]),
            vec![text_row(&["1", "2", "3"])],
        )
        .unwrap();
        assert_eq!(series.column_names(), vec!["close", "close.1", "column_2"]);
    }

    #[test]
    fn date_column_is_promoted() {
        let series = build_series(
            Some(vec!["date".into(), "close".into()]),
            vec![text_row(&["2024-01-02", "1"]), text_row(&["2024-01-03", "2"])],
        )
        .unwrap();
        assert_eq!(series.dates().unwrap().len(), 2);
        assert_eq!(series.column_names(), vec!["close"]);
    }

    #[test]
    fn empty_grid_builds_empty_series() {
        let series = build_series(Some(vec!["open".into(), "close".into()]), vec![]).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.column_names(), vec!["open", "close"]);
    }
}
