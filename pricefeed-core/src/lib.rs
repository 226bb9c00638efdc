//! pricefeed core: price series loading and return calculation.
//!
//! This crate contains:
//! - `PriceSeries`, a dated table of open/high/low/close/volume columns
//! - Source routines for Yahoo Finance, per-symbol CSV files and multi-sheet workbooks
//! - `DataLoader`, which owns the symbol table and dispatches by source name
//! - Simple and log return calculation written back into stored series

pub mod data;
pub mod loader;
pub mod returns;
pub mod series;

pub use data::{
    DataError, LoadOutcome, LoadWarning, MarketDataProvider, Source, SourceOptions, YahooProvider,
    DEFAULT_CSV_DIRECTORY, DEFAULT_INTERVAL,
};
pub use loader::{DataLoader, LoaderError};
pub use returns::ReturnMethod;
pub use series::{Column, ColumnData, PriceSeries, RowIndex};
