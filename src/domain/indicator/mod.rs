//! Technical indicators over a [`TimeSeriesTable`].
//!
//! The submodules hold pure series functions over closing prices that return
//! one `Option<f64>` per input row (`None` during warmup). The functions in
//! this module write those series into the table as named columns:
//! - `Moving_Average`: simple moving average of Close
//! - `RSI`: relative strength index from rolling mean gains/losses
//! - `EMA_{short}`, `EMA_{long}`, `MACD`, `Signal_Line`

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use ema::calculate_ema;
pub use macd::{calculate_macd, MacdSeries};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

use crate::domain::error::StockDataError;
use crate::domain::series::TimeSeriesTable;

pub const MOVING_AVERAGE: &str = "Moving_Average";
pub const RSI: &str = "RSI";
pub const MACD: &str = "MACD";
pub const SIGNAL_LINE: &str = "Signal_Line";

pub const DEFAULT_MA_WINDOW: usize = 5;
pub const DEFAULT_RSI_WINDOW: usize = 14;

/// Column name for an EMA of Close with the given span (`EMA_12`).
pub fn ema_column(span: usize) -> String {
    format!("EMA_{}", span)
}

/// Windows used when enriching a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorSettings {
    pub ma_window: usize,
    pub rsi_window: usize,
    pub macd_short: usize,
    pub macd_long: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            ma_window: DEFAULT_MA_WINDOW,
            rsi_window: DEFAULT_RSI_WINDOW,
            macd_short: macd::DEFAULT_FAST,
            macd_long: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
        }
    }
}

/// Append (or overwrite) the `Moving_Average` column.
pub fn add_moving_average(
    table: &mut TimeSeriesTable,
    window: usize,
) -> Result<(), StockDataError> {
    let values = calculate_sma(&table.closes(), window);
    table.set_column(MOVING_AVERAGE, values)
}

/// Append (or overwrite) the `RSI` column.
pub fn compute_rsi(table: &mut TimeSeriesTable, window: usize) -> Result<(), StockDataError> {
    let values = calculate_rsi(&table.closes(), window);
    table.set_column(RSI, values)
}

/// Append (or overwrite) the EMA, `MACD` and `Signal_Line` columns.
pub fn compute_macd(
    table: &mut TimeSeriesTable,
    short: usize,
    long: usize,
    signal: usize,
) -> Result<(), StockDataError> {
    let series = calculate_macd(&table.closes(), short, long, signal);
    table.set_column(&ema_column(short), series.ema_fast)?;
    table.set_column(&ema_column(long), series.ema_slow)?;
    table.set_column(MACD, series.macd)?;
    table.set_column(SIGNAL_LINE, series.signal)
}

/// Moving average, RSI and MACD in that column order.
pub fn enrich(
    table: &mut TimeSeriesTable,
    settings: &IndicatorSettings,
) -> Result<(), StockDataError> {
    add_moving_average(table, settings.ma_window)?;
    compute_rsi(table, settings.rsi_window)?;
    compute_macd(
        table,
        settings.macd_short,
        settings.macd_long,
        settings.macd_signal,
    )
}
