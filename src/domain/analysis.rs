//! Summary statistics and fluctuation alerts over a [`TimeSeriesTable`].

use crate::domain::error::StockDataError;
use crate::domain::indicator::{MACD, RSI, SIGNAL_LINE};
use crate::domain::series::TimeSeriesTable;
use chrono::NaiveDate;

/// Arithmetic mean of the Close column.
pub fn average_close(table: &TimeSeriesTable) -> Result<f64, StockDataError> {
    if table.is_empty() {
        return Err(StockDataError::EmptyData);
    }
    let sum: f64 = table.bars().iter().map(|b| b.close).sum();
    Ok(sum / table.len() as f64)
}

/// Non-negative percentage threshold for fluctuation alerts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluctuationThreshold(f64);

impl FluctuationThreshold {
    pub fn new(pct: f64) -> Result<Self, StockDataError> {
        if !pct.is_finite() || pct < 0.0 {
            return Err(StockDataError::configuration(format!(
                "fluctuation threshold must be a non-negative percentage, got {}",
                pct
            )));
        }
        Ok(Self(pct))
    }

    pub fn pct(&self) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fluctuation {
    pub date: NaiveDate,
    pub pct_change: f64,
}

/// Day-over-day close changes whose magnitude reaches `threshold`.
///
/// Each change is stamped with the later date. Unchanged days are never
/// reported, so a zero threshold yields every day that moved. A `None`
/// threshold means no notification was requested and yields nothing.
pub fn detect_fluctuations(
    table: &TimeSeriesTable,
    threshold: Option<FluctuationThreshold>,
) -> Vec<Fluctuation> {
    let Some(threshold) = threshold else {
        return Vec::new();
    };

    table
        .bars()
        .windows(2)
        .filter_map(|w| {
            let pct_change = w[1].pct_change_from(w[0].close)?;
            if pct_change != 0.0 && pct_change.abs() >= threshold.pct() {
                Some(Fluctuation {
                    date: w[1].date,
                    pct_change,
                })
            } else {
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSummary {
    pub rows: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub average_close: f64,
    pub min_close: f64,
    pub max_close: f64,
    pub total_change_pct: Option<f64>,
    pub latest_rsi: Option<f64>,
    pub latest_macd: Option<f64>,
    pub latest_signal: Option<f64>,
}

pub fn summarize(table: &TimeSeriesTable) -> Result<PriceSummary, StockDataError> {
    let average = average_close(table)?;
    let bars = table.bars();
    let (first, last) = match (bars.first(), bars.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Err(StockDataError::EmptyData),
    };

    let min_close = bars.iter().map(|b| b.close).fold(f64::INFINITY, f64::min);
    let max_close = bars
        .iter()
        .map(|b| b.close)
        .fold(f64::NEG_INFINITY, f64::max);

    Ok(PriceSummary {
        rows: bars.len(),
        first_date: first.date,
        last_date: last.date,
        average_close: average,
        min_close,
        max_close,
        total_change_pct: last.pct_change_from(first.close),
        latest_rsi: table.latest(RSI),
        latest_macd: table.latest(MACD),
        latest_signal: table.latest(SIGNAL_LINE),
    })
}
