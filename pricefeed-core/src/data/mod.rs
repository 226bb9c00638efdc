//! Data sources: remote provider, CSV files, spreadsheet workbooks.

pub mod csv_import;
pub mod dates;
pub mod excel;
pub mod options;
pub mod outcome;
pub mod provider;
pub mod table;
pub mod yahoo;

pub use csv_import::load_csv;
pub use excel::load_excel;
pub use options::{
    CsvParseOptions, ExcelParseOptions, Source, SourceOptions, UnsupportedSource,
    DEFAULT_CSV_DIRECTORY, DEFAULT_INTERVAL,
};
pub use outcome::{LoadOutcome, LoadWarning};
pub use provider::{DataError, MarketDataProvider};
pub use yahoo::YahooProvider;
