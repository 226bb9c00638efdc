//! Per-call ingestion results and non-fatal warnings.

use crate::series::PriceSeries;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A symbol-level problem that did not abort the load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadWarning {
    /// The remote provider returned an error for this symbol.
    FetchFailed { symbol: String, reason: String },
    /// The provider table lacked `Open` and/or `Close`; symbol skipped.
    MissingProviderColumns { symbol: String, missing: Vec<String> },
    /// No `<symbol>.csv` in the configured directory; symbol skipped.
    FileNotFound { symbol: String, path: PathBuf },
    /// A canonical price column is absent; the series was still loaded.
    MissingColumn { symbol: String, column: String },
    /// The workbook sheet for this symbol could not be read; symbol skipped.
    SheetFailed { symbol: String, reason: String },
}

impl LoadWarning {
    pub fn symbol(&self) -> &str {
        match self {
            LoadWarning::FetchFailed { symbol, .. }
            | LoadWarning::MissingProviderColumns { symbol, .. }
            | LoadWarning::FileNotFound { symbol, .. }
            | LoadWarning::MissingColumn { symbol, .. }
            | LoadWarning::SheetFailed { symbol, .. } => symbol,
        }
    }

    /// Whether the symbol was dropped from the result.
    pub fn skipped_symbol(&self) -> bool {
        !matches!(self, LoadWarning::MissingColumn { .. })
    }
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::FetchFailed { symbol, reason } => {
                write!(f, "failed to fetch {symbol}: {reason}")
            }
            LoadWarning::MissingProviderColumns { symbol, missing } => {
                write!(
                    f,
                    "missing required columns for symbol {symbol}: {}",
                    missing.join(", ")
                )
            }
            LoadWarning::FileNotFound { symbol, path } => {
                write!(f, "file not found for symbol {symbol} at {}", path.display())
            }
            LoadWarning::MissingColumn { symbol, column } => {
                write!(f, "missing required column '{column}' for symbol {symbol}")
            }
            LoadWarning::SheetFailed { symbol, reason } => {
                write!(f, "error loading sheet for symbol {symbol}: {reason}")
            }
        }
    }
}

/// Series ingested by one `load_from_source` call, plus the warnings raised.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub series: BTreeMap<String, PriceSeries>,
    pub warnings: Vec<LoadWarning>,
}

impl LoadOutcome {
    /// Log a warning and keep it for the caller.
    pub(crate) fn warn(&mut self, warning: LoadWarning) {
        tracing::warn!(symbol = warning.symbol(), "{warning}");
        self.warnings.push(warning);
    }

    pub(crate) fn insert(&mut self, symbol: &str, series: PriceSeries) {
        tracing::debug!(symbol, rows = series.len(), "loaded series");
        self.series.insert(symbol.to_string(), series);
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.series.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_messages_name_the_symbol() {
        let w = LoadWarning::FileNotFound {
            symbol: "AAPL".into(),
            path: PathBuf::from("./data/AAPL.csv"),
        };
        assert_eq!(w.symbol(), "AAPL");
        assert_eq!(
            w.to_string(),
            "file not found for symbol AAPL at ./data/AAPL.csv"
        );
        assert!(w.skipped_symbol());

        let w = LoadWarning::MissingColumn {
            symbol: "MSFT".into(),
            column: "volume".into(),
        };
        assert!(!w.skipped_symbol());
        assert_eq!(
            w.to_string(),
            "missing required column 'volume' for symbol MSFT"
        );
    }
}
