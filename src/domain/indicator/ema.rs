//! Exponential Moving Average.
//!
//! k = 2/(n+1), seeded with the first value, then EMA[i] = x[i]*k + EMA[i-1]*(1-k).
//! No bias adjustment, so every row is defined.
//!
//! Evaluated as EMA[i-1] + k*(x[i] - EMA[i-1]) so a constant input stays exact.

pub fn calculate_ema(values: &[f64], span: usize) -> Vec<Option<f64>> {
    if span == 0 || values.is_empty() {
        return vec![None; values.len()];
    }

    let k = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = values[0];
    out.push(Some(ema));

    for &x in &values[1..] {
        ema += k * (x - ema);
        out.push(Some(ema));
    }

    out
}
