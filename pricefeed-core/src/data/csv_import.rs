//! CSV import: one `<symbol>.csv` per symbol in a directory.
//!
//! A missing file skips the symbol with a warning. Missing canonical price
//! columns are reported but do not reject the file. Anything else that goes
//! wrong (unreadable file, malformed CSV, unparseable dates) aborts the call.

use super::options::{CsvParseOptions, SourceOptions};
use super::outcome::{LoadOutcome, LoadWarning};
use super::provider::DataError;
use super::table::{build_series, RawCell};
use crate::series::PriceSeries;
use std::path::{Path, PathBuf};

/// Path of the CSV file for `symbol` under `directory`.
pub fn csv_path(directory: &Path, symbol: &str) -> PathBuf {
    directory.join(format!("{symbol}.csv"))
}

/// Load each symbol's CSV file in order.
pub fn load_csv(symbols: &[&str], options: &SourceOptions) -> Result<LoadOutcome, DataError> {
    let parse = CsvParseOptions::from_parser_map(&options.parser)?;
    let directory = options.csv_directory();
    let mut outcome = LoadOutcome::default();

    for symbol in symbols {
        let path = csv_path(&directory, symbol);
        if !path.exists() {
            outcome.warn(LoadWarning::FileNotFound {
                symbol: symbol.to_string(),
                path,
            });
            continue;
        }

        let series = read_csv(&path, &parse)?;

        for column in series.missing_price_columns() {
            outcome.warn(LoadWarning::MissingColumn {
                symbol: symbol.to_string(),
                column: column.to_string(),
            });
        }

        outcome.insert(symbol, series);
    }

    Ok(outcome)
}

/// Parse a single CSV file into a series.
pub fn read_csv(path: &Path, parse: &CsvParseOptions) -> Result<PriceSeries, DataError> {
    let content = std::fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    // skip_rows counts physical lines before the header.
    let body = skip_lines(&content, parse.skip_rows);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(parse.delimiter)
        .has_headers(parse.has_header)
        .quote(parse.quote)
        .comment(parse.comment)
        .trim(if parse.trim {
            csv::Trim::All
        } else {
            csv::Trim::None
        })
        .flexible(true)
        .from_reader(body.as_bytes());

    let csv_err = |source: csv::Error| DataError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let headers = if parse.has_header {
        Some(
            reader
                .headers()
                .map_err(csv_err)?
                .iter()
                .map(str::to_string)
                .collect(),
        )
    } else {
        None
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        rows.push(record.iter().map(RawCell::from_text).collect());
    }

    build_series(headers, rows)
}

fn skip_lines(content: &str, n: usize) -> &str {
    let mut rest = content;
    for _ in 0..n {
        match rest.find('\n') {
            Some(pos) => rest = &rest[pos + 1..],
            None => return "",
        }
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn read_csv_promotes_date_and_keeps_extra_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "SPY.csv",
            "date,open,high,low,close,volume,exchange\n\
             2024-01-02,470.1,473.0,468.2,472.6,1000,ARCA\n\
             2024-01-03,472.0,474.5,469.9,470.3,1200,ARCA\n",
        );

        let series = read_csv(&path, &CsvParseOptions::default()).unwrap();
        assert_eq!(series.len(), 2);
        assert!(series.dates().is_some());
        assert_eq!(
            series.column_names(),
            vec!["open", "high", "low", "close", "volume", "exchange"]
        );
        assert_eq!(series.close().unwrap(), &[Some(472.6), Some(470.3)]);
        assert!(series.column("exchange").unwrap().data.as_text().is_some());
    }

    #[test]
    fn read_csv_honours_delimiter_and_skip_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "X.csv",
            "exported by terminal\n# comment line\nclose;volume\n1,5;10\n",
        );
        let parse = CsvParseOptions {
            delimiter: b';',
            skip_rows: 1,
            comment: Some(b'#'),
            ..CsvParseOptions::default()
        };
        let series = read_csv(&path, &parse).unwrap();
        assert_eq!(series.column_names(), vec!["close", "volume"]);
        // "1,5" is not a float literal, so the column stays textual.
        assert!(series.close().is_none());
        assert_eq!(series.numeric("volume").unwrap(), &[Some(10.0)]);
    }

    #[test]
    fn read_csv_without_header_numbers_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "X.csv", "1,2\n3,4\n");
        let parse = CsvParseOptions {
            has_header: false,
            ..CsvParseOptions::default()
        };
        let series = read_csv(&path, &parse).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.numeric("column_0").unwrap(), &[Some(1.0), Some(3.0)]);
    }

    #[test]
    fn load_csv_skips_missing_files_and_warns_on_missing_columns() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "AAPL.csv", "date,close\n2024-01-02,185.6\n");

        let options = SourceOptions::new().with_directory(dir.path());
        let outcome = load_csv(&["AAPL", "GHOST"], &options).unwrap();

        assert_eq!(outcome.symbols(), vec!["AAPL"]);
        let skipped: Vec<_> = outcome
            .warnings
            .iter()
            .filter(|w| w.skipped_symbol())
            .map(|w| w.symbol())
            .collect();
        assert_eq!(skipped, vec!["GHOST"]);

        let missing: Vec<_> = outcome
            .warnings
            .iter()
            .filter_map(|w| match w {
                LoadWarning::MissingColumn { column, .. } => Some(column.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(missing, vec!["open", "high", "low", "volume"]);
    }

    #[test]
    fn load_csv_rejects_unknown_parser_option() {
        let options = SourceOptions::new().with_parser_option("engine", "python");
        let err = load_csv(&["AAPL"], &options).unwrap_err();
        assert!(matches!(err, DataError::InvalidOption { .. }));
    }

    #[test]
    fn load_csv_fails_on_bad_dates() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "BAD.csv", "date,close\nsoon,1\n");
        let options = SourceOptions::new().with_directory(dir.path());
        let err = load_csv(&["BAD"], &options).unwrap_err();
        assert!(matches!(err, DataError::InvalidDate { .. }));
    }
}
