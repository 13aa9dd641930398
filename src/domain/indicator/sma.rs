//! Simple Moving Average of closing prices.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) rows are undefined.

pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }

    closes
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 < period {
                None
            } else {
                let window = &closes[i + 1 - period..=i];
                Some(window.iter().sum::<f64>() / period as f64)
            }
        })
        .collect()
}
