//! OHLCV bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// Percentage change of this bar's close relative to `prev_close`.
    /// `None` when the previous close is zero.
    pub fn pct_change_from(&self, prev_close: f64) -> Option<f64> {
        if prev_close == 0.0 {
            return None;
        }
        Some((self.close - prev_close) / prev_close * 100.0)
    }

    /// Basic sanity: finite prices, low <= high.
    pub fn is_well_formed(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.is_finite()) && self.low <= self.high && self.volume >= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> OhlcvBar {
        OhlcvBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000,
        }
    }

    #[test]
    fn pct_change_up() {
        let bar = sample_bar();
        // (105 - 100) / 100 = 5%
        assert!((bar.pct_change_from(100.0).unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn pct_change_down() {
        let bar = sample_bar();
        // (105 - 140) / 140 = -25%
        assert!((bar.pct_change_from(140.0).unwrap() + 25.0).abs() < 1e-12);
    }

    #[test]
    fn pct_change_zero_base() {
        assert!(sample_bar().pct_change_from(0.0).is_none());
    }

    #[test]
    fn well_formed_checks() {
        let bar = sample_bar();
        assert!(bar.is_well_formed());

        let inverted = OhlcvBar {
            high: 80.0,
            ..sample_bar()
        };
        assert!(!inverted.is_well_formed());

        let nan = OhlcvBar {
            close: f64::NAN,
            ..sample_bar()
        };
        assert!(!nan.is_well_formed());
    }
}
