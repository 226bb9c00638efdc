//! Spreadsheet import: one sheet per symbol in a single workbook.
//!
//! The workbook path is checked before any symbol is read; a missing file is
//! fatal. Per-sheet problems only skip that symbol.

use super::options::{ExcelParseOptions, SourceOptions};
use super::outcome::{LoadOutcome, LoadWarning};
use super::provider::DataError;
use super::table::{build_series, RawCell};
use crate::series::PriceSeries;
use calamine::{open_workbook_auto, Data, Range, Reader};

/// Load the sheet named after each symbol from `options.file_path`.
pub fn load_excel(symbols: &[&str], options: &SourceOptions) -> Result<LoadOutcome, DataError> {
    let path = options
        .file_path
        .as_deref()
        .ok_or(DataError::MissingOption("file_path"))?;
    if !path.exists() {
        return Err(DataError::WorkbookNotFound(path.to_path_buf()));
    }
    let parse = ExcelParseOptions::from_parser_map(&options.parser)?;

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| DataError::Workbook(format!("{}: {e}", path.display())))?;

    let mut outcome = LoadOutcome::default();
    for symbol in symbols {
        let series = workbook
            .worksheet_range(symbol)
            .map_err(|e| DataError::Workbook(e.to_string()))
            .and_then(|range| range_to_series(&range, &parse));

        match series {
            Ok(series) => outcome.insert(symbol, series),
            Err(e) => outcome.warn(LoadWarning::SheetFailed {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    Ok(outcome)
}

/// Convert a worksheet range into a series.
pub fn range_to_series(
    range: &Range<Data>,
    parse: &ExcelParseOptions,
) -> Result<PriceSeries, DataError> {
    let mut rows = range.rows().skip(parse.skip_rows);

    let headers = if parse.has_header {
        Some(
            rows.next()
                .map(|row| row.iter().map(header_name).collect())
                .unwrap_or_default(),
        )
    } else {
        None
    };

    let body = rows
        .map(|row| row.iter().map(to_raw_cell).collect())
        .collect();

    build_series(headers, body)
}

fn header_name(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn to_raw_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Int(v) => RawCell::Number(*v as f64),
        Data::Float(v) => RawCell::Number(*v),
        Data::Bool(b) => RawCell::Number(if *b { 1.0 } else { 0.0 }),
        Data::String(s) => RawCell::from_text(s),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(dt) => RawCell::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => RawCell::Missing,
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
        Data::Error(_) | Data::Empty => RawCell::Missing,
    }
}
