//! Market data port trait.

use crate::domain::error::StockDataError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::query::Query;

pub trait MarketDataPort {
    /// Canonical symbol the provider knows `symbol` by, or `None` when the
    /// provider has no such instrument.
    fn lookup_symbol(&self, symbol: &str) -> Result<Option<String>, StockDataError>;

    /// Daily bars for the query. May return an empty vector when the
    /// provider has nothing for the range.
    fn fetch_history(&self, query: &Query) -> Result<Vec<OhlcvBar>, StockDataError>;
}
