//! DataLoader: owns the symbol table and routes loads to a source.
//!
//! Ingestion is best-effort per symbol: a symbol that cannot be loaded is
//! logged, recorded as a [`LoadWarning`] and left out of the result. Return
//! calculation is stricter: an unknown method or a series without a numeric
//! `close` column aborts the whole call. Symbols already updated earlier in
//! that call keep their new `return` column; there is no rollback.

use crate::data::{
    load_csv, load_excel, DataError, LoadOutcome, LoadWarning, MarketDataProvider, Source,
    SourceOptions, UnsupportedSource, YahooProvider,
};
use crate::returns::{compute_returns, ReturnMethod, UnsupportedMethod};
use crate::series::{Column, PriceSeries, RETURN_COLUMN};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Provider field names and their canonical replacements.
const PROVIDER_RENAMES: [(&str, &str); 5] = [
    ("Open", "open"),
    ("High", "high"),
    ("Low", "low"),
    ("Close", "close"),
    ("Volume", "volume"),
];

/// Fields a provider table must carry to be accepted.
const PROVIDER_REQUIRED: [&str; 2] = ["Open", "Close"];

/// Errors surfaced to callers of the loader.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error(transparent)]
    UnsupportedSource(#[from] UnsupportedSource),

    #[error(transparent)]
    UnsupportedMethod(#[from] UnsupportedMethod),

    #[error("No data loaded for symbol {0}")]
    SymbolNotFound(String),

    #[error("series for {symbol} has no numeric '{column}' column")]
    MissingColumn { symbol: String, column: String },

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Loads price series from a source and keeps them keyed by symbol.
pub struct DataLoader {
    data: HashMap<String, PriceSeries>,
    provider: Option<Box<dyn MarketDataProvider>>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Empty loader. The Yahoo provider is created on the first remote load.
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            provider: None,
        }
    }

    /// Empty loader that fetches remote data through `provider`.
    pub fn with_provider(provider: Box<dyn MarketDataProvider>) -> Self {
        Self {
            data: HashMap::new(),
            provider: Some(provider),
        }
    }

    /// Load `symbols` from `source` and merge them into the symbol table.
    ///
    /// `source` is matched case-insensitively against `yfinance`, `csv` and
    /// `excel`. Dates and `interval` only affect the remote source. The
    /// returned outcome holds the symbols that loaded plus any warnings;
    /// previously loaded symbols with the same name are replaced.
    pub fn load_from_source(
        &mut self,
        source: &str,
        symbols: &[&str],
        start_date: NaiveDate,
        end_date: NaiveDate,
        interval: &str,
        options: &SourceOptions,
    ) -> Result<LoadOutcome, LoaderError> {
        let source: Source = source.parse()?;

        let outcome = match source {
            Source::YFinance => self.load_from_provider(symbols, start_date, end_date, interval)?,
            Source::Csv => load_csv(symbols, options)?,
            Source::Excel => load_excel(symbols, options)?,
        };

        tracing::info!(
            %source,
            requested = symbols.len(),
            loaded = outcome.series.len(),
            warnings = outcome.warnings.len(),
            "load complete"
        );

        self.data.extend(
            outcome
                .series
                .iter()
                .map(|(symbol, series)| (symbol.clone(), series.clone())),
        );
        Ok(outcome)
    }

    /// The configured provider, creating the Yahoo provider on first use.
    fn provider(&mut self) -> Result<&dyn MarketDataProvider, DataError> {
        if self.provider.is_none() {
            self.provider = Some(Box::new(YahooProvider::new()?));
        }
        self.provider
            .as_deref()
            .ok_or_else(|| DataError::Other("no market data provider configured".into()))
    }

    fn load_from_provider(
        &mut self,
        symbols: &[&str],
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Result<LoadOutcome, DataError> {
        let provider = self.provider()?;

        let mut outcome = LoadOutcome::default();
        for symbol in symbols {
            let mut series = match provider.fetch_history(symbol, start, end, interval) {
                Ok(series) => series,
                Err(e) => {
                    outcome.warn(LoadWarning::FetchFailed {
                        symbol: symbol.to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let missing: Vec<String> = PROVIDER_REQUIRED
                .iter()
                .filter(|name| !series.has_column(name))
                .map(|name| name.to_string())
                .collect();
            if !missing.is_empty() {
                outcome.warn(LoadWarning::MissingProviderColumns {
                    symbol: symbol.to_string(),
                    missing,
                });
                continue;
            }

            series.rename_columns(&PROVIDER_RENAMES);
            outcome.insert(symbol, series);
        }
        Ok(outcome)
    }

    /// Add a `return` column to loaded series.
    ///
    /// `symbols` of `None` means every loaded symbol. Unloaded symbols are
    /// skipped with a warning. `method` (`simple` or `log`, any case) is
    /// validated when the first loaded symbol is reached, before anything is
    /// written.
    pub fn calculate_returns(
        &mut self,
        symbols: Option<&[&str]>,
        period: usize,
        method: &str,
    ) -> Result<BTreeMap<String, PriceSeries>, LoaderError> {
        let requested: Vec<String> = match symbols {
            Some(s) => s.iter().map(|s| s.to_string()).collect(),
            None => self.symbols().into_iter().map(String::from).collect(),
        };

        let mut parsed: Option<ReturnMethod> = None;
        let mut result = BTreeMap::new();

        for symbol in requested {
            let Some(series) = self.data.get_mut(&symbol) else {
                tracing::warn!(symbol = %symbol, "No data loaded for symbol {symbol}");
                continue;
            };

            let kind = match parsed {
                Some(kind) => kind,
                None => *parsed.insert(method.parse::<ReturnMethod>()?),
            };

            let returns = series
                .close()
                .map(|closes| compute_returns(closes, period, kind))
                .ok_or_else(|| LoaderError::MissingColumn {
                    symbol: symbol.clone(),
                    column: "close".into(),
                })?;

            series.set_column(Column::numeric(RETURN_COLUMN, returns))?;
            tracing::debug!(symbol = %symbol, period, method = %kind, "returns calculated");
            result.insert(symbol, series.clone());
        }

        Ok(result)
    }

    /// One-period simple returns for every loaded symbol.
    pub fn calculate_default_returns(
        &mut self,
    ) -> Result<BTreeMap<String, PriceSeries>, LoaderError> {
        self.calculate_returns(None, 1, ReturnMethod::Simple.as_str())
    }

    /// Series for one symbol.
    pub fn get_data(&self, symbol: &str) -> Result<&PriceSeries, LoaderError> {
        self.data
            .get(symbol)
            .ok_or_else(|| LoaderError::SymbolNotFound(symbol.to_string()))
    }

    /// Copy of every loaded series.
    pub fn get_all_data(&self) -> BTreeMap<String, PriceSeries> {
        self.data
            .iter()
            .map(|(symbol, series)| (symbol.clone(), series.clone()))
            .collect()
    }

    /// Loaded symbols, sorted.
    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.data.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }
}
