//! Query parameters for a history request.
//!
//! A query names a ticker and exactly one of a provider period token
//! (`"5d"`, `"1mo"`, `"ytd"`...) or an explicit `[start, end)` date range.

use crate::domain::error::StockDataError;
use chrono::{Datelike, Months, NaiveDate};
use std::fmt;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const CHART_EXTENSION: &str = "png";

/// Period tokens commonly accepted by the provider.
pub const COMMON_PERIODS: &[&str] = &[
    "1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataRange {
    Period(String),
    Dates { start: NaiveDate, end: NaiveDate },
}

impl fmt::Display for DataRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataRange::Period(p) => write!(f, "{}", p),
            DataRange::Dates { start, end } => write!(f, "{} to {}", start, end),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    ticker: String,
    range: DataRange,
}

impl Query {
    /// Build a query from the loose inputs a caller collects. Exactly one of
    /// `period` or the `(start, end)` pair must be given.
    pub fn new(
        ticker: &str,
        period: Option<&str>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self, StockDataError> {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(StockDataError::configuration("ticker must not be empty"));
        }
        reject_path_text("ticker", &ticker)?;

        let range = match (period, start, end) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                return Err(StockDataError::configuration(
                    "supply either a period or a date range, not both",
                ));
            }
            (Some(p), None, None) => {
                let p = p.trim();
                if p.is_empty() {
                    return Err(StockDataError::configuration("period must not be empty"));
                }
                reject_path_text("period", p)?;
                DataRange::Period(p.to_string())
            }
            (None, Some(start), Some(end)) => {
                if start >= end {
                    return Err(StockDataError::configuration(format!(
                        "start date {} must be before end date {}",
                        start, end
                    )));
                }
                DataRange::Dates { start, end }
            }
            (None, None, None) => {
                return Err(StockDataError::configuration(
                    "supply either a period or a date range",
                ));
            }
            (None, _, _) => {
                return Err(StockDataError::configuration(
                    "a date range needs both a start and an end date",
                ));
            }
        };

        Ok(Self { ticker, range })
    }

    pub fn period(ticker: &str, period: &str) -> Result<Self, StockDataError> {
        Self::new(ticker, Some(period), None, None)
    }

    pub fn dates(ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Self, StockDataError> {
        Self::new(ticker, None, Some(start), Some(end))
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn range(&self) -> &DataRange {
        &self.range
    }

    /// Human-readable label for titles: `"5d"` or `"2024-01-01 to 2024-02-01"`.
    pub fn period_label(&self) -> String {
        self.range.to_string()
    }

    /// Deterministic file stem for the rendered chart.
    pub fn chart_stem(&self) -> String {
        match &self.range {
            DataRange::Period(p) => format!("{}_{}", self.ticker, p),
            DataRange::Dates { start, end } => format!("{}_{}_to_{}", self.ticker, start, end),
        }
    }

    /// `{TICKER}_{period}.png` or `{TICKER}_{start}_to_{end}.png`.
    pub fn chart_file_name(&self) -> String {
        format!("{}.{}", self.chart_stem(), CHART_EXTENSION)
    }
}

pub fn parse_date(input: &str) -> Result<NaiveDate, StockDataError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|_| {
        StockDataError::configuration(format!(
            "invalid date '{}' (expected YYYY-MM-DD)",
            input.trim()
        ))
    })
}

/// Tickers and period tokens end up in the chart file name.
fn reject_path_text(what: &str, value: &str) -> Result<(), StockDataError> {
    if value.contains(['/', '\\']) || value.contains("..") {
        return Err(StockDataError::configuration(format!(
            "{} '{}' must not contain path separators or '..'",
            what, value
        )));
    }
    Ok(())
}

/// Local interpretation of provider period tokens, for sources that do not
/// understand them natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodSpan {
    /// Last N trading rows.
    Days(u32),
    Weeks(u32),
    Months(u32),
    Years(u32),
    YearToDate,
    Max,
}

impl PeriodSpan {
    pub fn parse(token: &str) -> Result<Self, StockDataError> {
        let token = token.trim().to_lowercase();
        match token.as_str() {
            "ytd" => return Ok(PeriodSpan::YearToDate),
            "max" => return Ok(PeriodSpan::Max),
            _ => {}
        }

        let unsupported =
            || StockDataError::configuration(format!("unsupported period '{}'", token));

        let (digits, unit) = if let Some(n) = token.strip_suffix("mo") {
            (n, "mo")
        } else if let Some(n) = token.strip_suffix("wk") {
            (n, "wk")
        } else if let Some(n) = token.strip_suffix('d') {
            (n, "d")
        } else if let Some(n) = token.strip_suffix('y') {
            (n, "y")
        } else {
            return Err(unsupported());
        };

        let n = match digits.parse::<u32>() {
            Ok(n) if n > 0 => n,
            _ => return Err(unsupported()),
        };

        Ok(match unit {
            "mo" => PeriodSpan::Months(n),
            "wk" => PeriodSpan::Weeks(n),
            "d" => PeriodSpan::Days(n),
            _ => PeriodSpan::Years(n),
        })
    }

    /// First calendar date covered when the series ends on `last`.
    /// `None` for spans that count rows or cover everything.
    pub fn start_date(&self, last: NaiveDate) -> Option<NaiveDate> {
        match *self {
            PeriodSpan::Days(_) | PeriodSpan::Max => None,
            PeriodSpan::Weeks(n) => last.checked_sub_days(chrono::Days::new(7 * n as u64)),
            PeriodSpan::Months(n) => last.checked_sub_months(Months::new(n)),
            PeriodSpan::Years(n) => last.checked_sub_months(Months::new(12 * n)),
            PeriodSpan::YearToDate => NaiveDate::from_ymd_opt(last.year(), 1, 1),
        }
    }
}
