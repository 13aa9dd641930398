//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//!
//! Default parameters: fast=12, slow=26, signal=9.
//! All EMAs are seeded with their first input, so no row is in warmup.

use crate::domain::indicator::calculate_ema;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub ema_fast: Vec<Option<f64>>,
    pub ema_slow: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
}

pub fn calculate_macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> MacdSeries {
    let ema_fast = calculate_ema(closes, fast);
    let ema_slow = calculate_ema(closes, slow);

    let macd: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let signal = if macd.iter().all(Option::is_some) {
        let line: Vec<f64> = macd.iter().flatten().copied().collect();
        calculate_ema(&line, signal_period)
    } else {
        vec![None; macd.len()]
    };

    MacdSeries {
        ema_fast,
        ema_slow,
        macd,
        signal,
    }
}
