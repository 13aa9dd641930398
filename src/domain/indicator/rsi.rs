//! RSI (Relative Strength Index).
//!
//! Uses simple rolling means of the last n price changes:
//! - gain = mean of positive changes, loss = mean of |negative changes|
//! - RSI = 100 - (100 / (1 + gain / loss))
//!
//! If loss == 0 and gain > 0: RSI = 100.
//! If loss == 0 and gain == 0 (flat window): undefined.
//!
//! Warmup: first n rows are undefined (row 0 has no change).

pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || closes.len() < 2 {
        return vec![None; closes.len()];
    }

    let mut gains = vec![0.0; closes.len()];
    let mut losses = vec![0.0; closes.len()];
    for i in 1..closes.len() {
        let change = closes[i] - closes[i - 1];
        gains[i] = if change > 0.0 { change } else { 0.0 };
        losses[i] = if change < 0.0 { -change } else { 0.0 };
    }

    let mut values = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        if i < period {
            values.push(None);
            continue;
        }

        let start = i + 1 - period;
        let avg_gain = gains[start..=i].iter().sum::<f64>() / period as f64;
        let avg_loss = losses[start..=i].iter().sum::<f64>() / period as f64;
        values.push(rsi_from_averages(avg_gain, avg_loss));
    }

    values
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            None
        } else {
            Some(100.0)
        }
    } else {
        Some(100.0 - (100.0 / (1.0 + avg_gain / avg_loss)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn rsi_empty() {
        assert!(calculate_rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_single_value() {
        assert_eq!(calculate_rsi(&[100.0], 14), vec![None]);
    }

    #[test]
    fn rsi_warmup_period() {
        let closes: Vec<f64> = (1..=15).map(|i| 100.0 + (i as f64 % 5.0) * 2.0).collect();
        let values = calculate_rsi(&closes, 14);

        assert_eq!(values.len(), 15);
        for (i, v) in values.iter().enumerate().take(14) {
            assert!(v.is_none(), "Row {} should be undefined", i);
        }
        assert!(values[14].is_some(), "Row 14 should be defined");
    }

    #[test]
    fn rsi_all_gains_no_losses() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let values = calculate_rsi(&closes, 14);
        assert_eq!(values[14], Some(100.0));
    }

    #[test]
    fn rsi_all_losses_no_gains() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let values = calculate_rsi(&closes, 14);
        assert_eq!(values[14], Some(0.0));
    }

    #[test]
    fn rsi_flat_series_is_undefined() {
        let values = calculate_rsi(&[50.0; 30], 14);
        assert!(values.iter().all(Option::is_none));
    }

    #[test]
    fn rsi_known_calculation() {
        // changes: +2, -1, +3 over window 3 -> gain 5/3, loss 1/3, RS 5
        let values = calculate_rsi(&[10.0, 12.0, 11.0, 14.0], 3);
        assert_eq!(&values[..3], &[None, None, None]);
        assert_relative_eq!(values[3].unwrap(), 100.0 - 100.0 / 6.0, epsilon = 1e-9);
    }

    #[test]
    fn rsi_window_slides() {
        // window 2 at row 3 covers changes -1, +3 -> gain 1.5, loss 0.5, RS 3
        let values = calculate_rsi(&[10.0, 12.0, 11.0, 14.0], 2);
        assert_relative_eq!(values[3].unwrap(), 75.0, epsilon = 1e-9);
    }

    #[test]
    fn rsi_zero_period() {
        assert_eq!(calculate_rsi(&[100.0, 101.0], 0), vec![None, None]);
    }

    #[test]
    fn rsi_increasing_series_saturates() {
        let closes: Vec<f64> = (0..40).map(|i| 10.0 + i as f64 * 0.5).collect();
        for window in [2, 5, 14, 30] {
            let values = calculate_rsi(&closes, window);
            for v in values.iter().skip(window) {
                assert_eq!(*v, Some(100.0));
            }
        }
    }

    proptest! {
        #[test]
        fn rsi_in_range(closes in prop::collection::vec(1.0f64..500.0, 2..80), period in 1usize..20) {
            let values = calculate_rsi(&closes, period);
            prop_assert_eq!(values.len(), closes.len());
            for v in values.into_iter().flatten() {
                prop_assert!((0.0..=100.0).contains(&v), "RSI {} out of range", v);
            }
        }
    }
}
