//! Market data provider trait and structured error types.
//!
//! The MarketDataProvider trait abstracts over remote sources (Yahoo Finance
//! today) so the loader can be driven by a mock in tests.

use crate::series::PriceSeries;
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for data operations.
///
/// These are designed to be displayable in both library and CLI contexts.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} for {symbol}")]
    Http { symbol: String, status: u16 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("unsupported interval '{0}'")]
    InvalidInterval(String),

    #[error("missing required option '{0}'")]
    MissingOption(&'static str),

    #[error("invalid option '{key}': {reason}")]
    InvalidOption { key: String, reason: String },

    #[error("Excel file not found: {}", .0.display())]
    WorkbookNotFound(PathBuf),

    #[error("workbook error: {0}")]
    Workbook(String),

    #[error("invalid date '{value}' in row {row}")]
    InvalidDate { row: usize, value: String },

    #[error("malformed table: {0}")]
    ShapeMismatch(String),

    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("data error: {0}")]
    Other(String),
}

/// Trait for remote market data providers.
///
/// Implementations return the provider's native schema (`Open`, `High`,
/// `Low`, `Close`, `Volume`, plus whatever extra columns the provider
/// carries), indexed by bar timestamp. Normalization to the canonical
/// lower-case schema happens in the loader, not here.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch a price history for `symbol` between `start` (inclusive) and
    /// `end` (exclusive) at the given sampling interval.
    fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Result<PriceSeries, DataError>;
}
