//! Return calculation over close prices.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How a return over `period` rows is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnMethod {
    /// `close[t] / close[t - period] - 1`
    #[default]
    Simple,
    /// `ln(close[t] / close[t - period])`
    Log,
}

impl ReturnMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnMethod::Simple => "simple",
            ReturnMethod::Log => "log",
        }
    }
}

impl fmt::Display for ReturnMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported return calculation method: {0}")]
pub struct UnsupportedMethod(pub String);

impl FromStr for ReturnMethod {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(ReturnMethod::Simple),
            "log" => Ok(ReturnMethod::Log),
            _ => Err(UnsupportedMethod(s.to_string())),
        }
    }
}

/// Compute returns over `period` rows.
///
/// The output has the same length as `closes`. The first `period` cells are
/// `None`, as is any cell whose current or lagged close is missing, or whose
/// lagged close is zero or non-finite. Log returns of non-positive ratios are
/// `None`.
pub fn compute_returns(
    closes: &[Option<f64>],
    period: usize,
    method: ReturnMethod,
) -> Vec<Option<f64>> {
    (0..closes.len())
        .map(|t| {
            let lagged = t.checked_sub(period)?;
            let current = closes[t]?;
            let base = closes[lagged]?;
            if base == 0.0 || !base.is_finite() || !current.is_finite() {
                return None;
            }
            let ratio = current / base;
            match method {
                ReturnMethod::Simple => Some(ratio - 1.0),
                ReturnMethod::Log => (ratio > 0.0).then(|| ratio.ln()),
            }
        })
        .collect()
}
