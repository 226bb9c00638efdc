//! pricefeed CLI: load price series and compute returns.
//!
//! Commands:
//! - `load`: load symbols from yfinance, csv or excel and print a summary
//!   (optionally with a return column, optionally as JSON)

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use pricefeed_core::{DataLoader, PriceSeries, RowIndex, SourceOptions, DEFAULT_INTERVAL};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pricefeed",
    about = "pricefeed CLI: load historical price series and derive returns"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load symbols from a source and print what was loaded.
    Load {
        /// Symbols to load (e.g., SPY QQQ AAPL).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Data source: yfinance, csv or excel.
        #[arg(long, default_value = "yfinance")]
        source: String,

        /// Start date (YYYY-MM-DD). Defaults to one year ago.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Sampling interval for yfinance (1d, 1wk, 1mo, ...).
        #[arg(long, default_value = DEFAULT_INTERVAL)]
        interval: String,

        /// TOML file with source options (directory, file_path, [parser]).
        #[arg(long)]
        options: Option<PathBuf>,

        /// Directory holding <SYMBOL>.csv files. Defaults to ./data.
        #[arg(long)]
        directory: Option<PathBuf>,

        /// Workbook path for the excel source.
        #[arg(long)]
        file_path: Option<PathBuf>,

        /// Parser option as key=value (repeatable), e.g. --parser sep=';'.
        #[arg(long = "parser", value_name = "KEY=VALUE")]
        parser: Vec<String>,

        /// Compute returns with this method (simple or log).
        #[arg(long)]
        returns: Option<String>,

        /// Lag in rows for return calculation.
        #[arg(long, default_value_t = 1)]
        period: usize,

        /// Print loaded series as JSON instead of a summary table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Load {
            symbols,
            source,
            start,
            end,
            interval,
            options,
            directory,
            file_path,
            parser,
            returns,
            period,
            json,
        } => {
            let flags = SourceOptions {
                directory,
                file_path,
                parser: parse_parser_flags(&parser)?,
            };
            let options = match options {
                Some(path) => SourceOptions::from_file(&path)
                    .with_context(|| format!("reading options from {}", path.display()))?
                    .merged_with(flags),
                None => flags,
            };
            run_load(
                symbols, &source, start, end, &interval, &options, returns, period, json,
            )
        }
    }
}

fn parse_parser_flags(flags: &[String]) -> Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for flag in flags {
        let Some((key, value)) = flag.split_once('=') else {
            bail!("--parser expects KEY=VALUE, got '{flag}'");
        };
        map.insert(key.trim().to_string(), value.to_string());
    }
    Ok(map)
}

fn parse_date(raw: Option<&str>, default: NaiveDate) -> Result<NaiveDate> {
    raw.map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("dates must be YYYY-MM-DD")
        .map(|d| d.unwrap_or(default))
}

#[allow(clippy::too_many_arguments)]
fn run_load(
    symbols: Vec<String>,
    source: &str,
    start: Option<String>,
    end: Option<String>,
    interval: &str,
    options: &SourceOptions,
    returns: Option<String>,
    period: usize,
    json: bool,
) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let start_date = parse_date(start.as_deref(), today - chrono::Duration::days(365))?;
    let end_date = parse_date(end.as_deref(), today)?;

    let sym_refs: Vec<&str> = symbols.iter().map(|s| s.as_str()).collect();

    let mut loader = DataLoader::new();
    let outcome =
        loader.load_from_source(source, &sym_refs, start_date, end_date, interval, options)?;

    if let Some(method) = returns.as_deref() {
        let loaded = outcome.symbols();
        loader.calculate_returns(Some(&loaded), period, method)?;
    }

    let data = loader.get_all_data();

    if json {
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        print_summary(&data);
    }

    if !outcome.warnings.is_empty() {
        eprintln!("\n{} warning(s):", outcome.warnings.len());
        for warning in &outcome.warnings {
            eprintln!("  {warning}");
        }
    }

    if data.is_empty() {
        bail!("no symbols loaded");
    }
    Ok(())
}

fn print_summary(data: &BTreeMap<String, PriceSeries>) {
    println!(
        "{:<10} {:>6}  {:<20} {:<20} {:>12} {:>10}",
        "symbol", "rows", "first", "last", "last close", "return"
    );
    for (symbol, series) in data {
        let (first, last) = index_bounds(series);
        let last_close = last_value(series.close())
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| "-".into());
        let last_return = last_value(series.returns())
            .map(|v| format!("{:.4}%", v * 100.0))
            .unwrap_or_else(|| "-".into());
        println!(
            "{symbol:<10} {:>6}  {first:<20} {last:<20} {last_close:>12} {last_return:>10}",
            series.len()
        );
    }
}

fn index_bounds(series: &PriceSeries) -> (String, String) {
    match series.index() {
        RowIndex::Dates(dates) => (
            dates.iter().flatten().next().map(|d| d.to_string()).unwrap_or_default(),
            dates.iter().rev().flatten().next().map(|d| d.to_string()).unwrap_or_default(),
        ),
        RowIndex::Positional(0) => (String::new(), String::new()),
        RowIndex::Positional(n) => ("0".into(), (n - 1).to_string()),
    }
}

fn last_value(cells: Option<&[Option<f64>]>) -> Option<f64> {
    cells?.iter().rev().find_map(|c| *c)
}
