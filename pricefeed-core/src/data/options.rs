//! Source identifiers and per-source options.
//!
//! `SourceOptions` is the configuration bag handed to `load_from_source`.
//! It can be built in code or read from TOML:
//!
//! ```toml
//! directory = "./data"
//!
//! [parser]
//! delimiter = ";"
//! skip_rows = "1"
//! ```

use super::provider::DataError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Directory searched for `<symbol>.csv` when none is configured.
pub const DEFAULT_CSV_DIRECTORY: &str = "./data";

/// Sampling interval used when the caller does not pick one.
pub const DEFAULT_INTERVAL: &str = "1d";

/// Where price data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[serde(rename = "yfinance")]
    YFinance,
    Csv,
    Excel,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::YFinance => "yfinance",
            Source::Csv => "csv",
            Source::Excel => "excel",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a source identifier is not one of the known sources.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported data source: {0}")]
pub struct UnsupportedSource(pub String);

impl FromStr for Source {
    type Err = UnsupportedSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yfinance" => Ok(Source::YFinance),
            "csv" => Ok(Source::Csv),
            "excel" => Ok(Source::Excel),
            _ => Err(UnsupportedSource(s.to_string())),
        }
    }
}

/// Options forwarded to the selected ingestion routine.
///
/// `directory` is read by the CSV source, `file_path` by the spreadsheet
/// source. `parser` holds reader tuning keys; each source validates the keys
/// it understands and rejects the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceOptions {
    pub directory: Option<PathBuf>,
    pub file_path: Option<PathBuf>,
    pub parser: BTreeMap<String, String>,
}

impl SourceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn with_file_path(mut self, file_path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    pub fn with_parser_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parser.insert(key.into(), value.into());
        self
    }

    /// CSV directory, falling back to `./data`.
    pub fn csv_directory(&self) -> PathBuf {
        self.directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_DIRECTORY))
    }

    /// Load options from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse options from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, DataError> {
        toml::from_str(content).map_err(|e| DataError::Other(format!("parse options TOML: {e}")))
    }

    /// Overlay `other` on top of `self`: set fields and parser keys in `other` win.
    pub fn merged_with(mut self, other: SourceOptions) -> Self {
        if other.directory.is_some() {
            self.directory = other.directory;
        }
        if other.file_path.is_some() {
            self.file_path = other.file_path;
        }
        self.parser.extend(other.parser);
        self
    }
}

/// Reader settings for delimited text files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvParseOptions {
    pub delimiter: u8,
    pub has_header: bool,
    pub quote: u8,
    pub comment: Option<u8>,
    pub skip_rows: usize,
    pub trim: bool,
}

impl Default for CsvParseOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            quote: b'"',
            comment: None,
            skip_rows: 0,
            trim: false,
        }
    }
}

impl CsvParseOptions {
    /// Interpret the parser map. Unknown keys are rejected.
    pub fn from_parser_map(map: &BTreeMap<String, String>) -> Result<Self, DataError> {
        let mut opts = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "delimiter" | "sep" => opts.delimiter = parse_byte(key, value)?,
                "has_header" | "header" => opts.has_header = parse_header(key, value)?,
                "quote" | "quotechar" => opts.quote = parse_byte(key, value)?,
                "comment" => opts.comment = Some(parse_byte(key, value)?),
                "skip_rows" | "skiprows" => opts.skip_rows = parse_usize(key, value)?,
                "trim" | "skipinitialspace" => opts.trim = parse_bool(key, value)?,
                _ => return Err(unknown_key(key, "csv")),
            }
        }
        Ok(opts)
    }
}

/// Reader settings for spreadsheet sheets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcelParseOptions {
    pub has_header: bool,
    pub skip_rows: usize,
}

impl Default for ExcelParseOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            skip_rows: 0,
        }
    }
}

impl ExcelParseOptions {
    /// Interpret the parser map. Unknown keys are rejected.
    pub fn from_parser_map(map: &BTreeMap<String, String>) -> Result<Self, DataError> {
        let mut opts = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "has_header" | "header" => opts.has_header = parse_header(key, value)?,
                "skip_rows" | "skiprows" => opts.skip_rows = parse_usize(key, value)?,
                _ => return Err(unknown_key(key, "excel")),
            }
        }
        Ok(opts)
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> DataError {
    DataError::InvalidOption {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn unknown_key(key: &str, source: &str) -> DataError {
    invalid(key, format!("not a recognized {source} parser option"))
}

fn parse_byte(key: &str, value: &str) -> Result<u8, DataError> {
    match value {
        "\\t" | "tab" => return Ok(b'\t'),
        _ => {}
    }
    match value.as_bytes() {
        [b] => Ok(*b),
        _ => Err(invalid(key, format!("expected a single ASCII character, got '{value}'"))),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, DataError> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(invalid(key, format!("expected a boolean, got '{value}'"))),
    }
}

/// `header = "none"` means the file has no header row; `"infer"` or `"0"`
/// mean the first row holds column names.
fn parse_header(key: &str, value: &str) -> Result<bool, DataError> {
    match value.to_lowercase().as_str() {
        "none" => Ok(false),
        "infer" | "0" => Ok(true),
        _ => parse_bool(key, value),
    }
}

fn parse_usize(key: &str, value: &str) -> Result<usize, DataError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(key, format!("expected a non-negative integer, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_parsing_is_case_insensitive() {
        assert_eq!("YFinance".parse::<Source>().unwrap(), Source::YFinance);
        assert_eq!("CSV".parse::<Source>().unwrap(), Source::Csv);
        assert_eq!("excel".parse::<Source>().unwrap(), Source::Excel);
    }

    #[test]
    fn unknown_source_is_rejected() {
        let err = "sql".parse::<Source>().unwrap_err();
        assert_eq!(err, UnsupportedSource("sql".into()));
        assert_eq!(err.to_string(), "Unsupported data source: sql");
    }

    #[test]
    fn csv_directory_defaults_to_data() {
        assert_eq!(SourceOptions::new().csv_directory(), PathBuf::from("./data"));
        assert_eq!(
            SourceOptions::new().with_directory("/tmp/prices").csv_directory(),
            PathBuf::from("/tmp/prices")
        );
    }

    #[test]
    fn options_parse_from_toml() {
        let opts = SourceOptions::from_toml(
            r#"
            file_path = "prices.xlsx"

            [parser]
            header = "none"
            "#,
        )
        .unwrap();
        assert_eq!(opts.file_path, Some(PathBuf::from("prices.xlsx")));
        assert_eq!(opts.directory, None);
        assert_eq!(opts.parser.get("header").map(String::as_str), Some("none"));
    }

    #[test]
    fn options_toml_rejects_unknown_fields() {
        assert!(SourceOptions::from_toml("dirctory = \"x\"").is_err());
    }

    #[test]
    fn merged_with_prefers_overlay() {
        let base = SourceOptions::new()
            .with_directory("a")
            .with_parser_option("sep", ";")
            .with_parser_option("trim", "true");
        let overlay = SourceOptions::new()
            .with_directory("b")
            .with_parser_option("sep", "|");
        let merged = base.merged_with(overlay);
        assert_eq!(merged.directory, Some(PathBuf::from("b")));
        assert_eq!(merged.parser["sep"], "|");
        assert_eq!(merged.parser["trim"], "true");
    }

    #[test]
    fn csv_parser_map_is_interpreted() {
        let map = SourceOptions::new()
            .with_parser_option("sep", "tab")
            .with_parser_option("header", "none")
            .with_parser_option("comment", "#")
            .with_parser_option("skip_rows", "2")
            .parser;
        let opts = CsvParseOptions::from_parser_map(&map).unwrap();
        assert_eq!(opts.delimiter, b'\t');
        assert!(!opts.has_header);
        assert_eq!(opts.comment, Some(b'#'));
        assert_eq!(opts.skip_rows, 2);
    }

    #[test]
    fn csv_parser_map_rejects_bad_values_and_keys() {
        let bad_value = SourceOptions::new()
            .with_parser_option("delimiter", ";;")
            .parser;
        assert!(matches!(
            CsvParseOptions::from_parser_map(&bad_value),
            Err(DataError::InvalidOption { .. })
        ));

        let bad_key = SourceOptions::new()
            .with_parser_option("sheet_name", "x")
            .parser;
        assert!(matches!(
            CsvParseOptions::from_parser_map(&bad_key),
            Err(DataError::InvalidOption { .. })
        ));
    }

    #[test]
    fn excel_parser_map_only_accepts_sheet_keys() {
        let ok = SourceOptions::new().with_parser_option("skiprows", "3").parser;
        assert_eq!(ExcelParseOptions::from_parser_map(&ok).unwrap().skip_rows, 3);

        let csv_only = SourceOptions::new().with_parser_option("sep", ";").parser;
        assert!(ExcelParseOptions::from_parser_map(&csv_only).is_err());
    }
}
