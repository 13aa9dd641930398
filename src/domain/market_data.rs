//! Ticker validation and history retrieval through a [`MarketDataPort`].

use crate::domain::error::StockDataError;
use crate::domain::query::Query;
use crate::domain::series::TimeSeriesTable;
use crate::ports::data_port::MarketDataPort;
use chrono::NaiveDate;
use tracing::{info, warn};

/// True iff the provider's canonical symbol for `symbol` matches it,
/// ignoring case. Provider failures count as invalid.
pub fn validate_ticker(port: &dyn MarketDataPort, symbol: &str) -> bool {
    match check_ticker(port, symbol) {
        Ok(()) => true,
        Err(StockDataError::InvalidTicker { .. }) => false,
        Err(e) => {
            warn!(symbol, error = %e, "ticker lookup failed");
            false
        }
    }
}

/// Like [`validate_ticker`] but keeps provider errors distinct from
/// `InvalidTicker` so callers can report them.
pub fn check_ticker(port: &dyn MarketDataPort, symbol: &str) -> Result<(), StockDataError> {
    let wanted = symbol.trim();
    let invalid = || StockDataError::InvalidTicker {
        ticker: wanted.to_uppercase(),
    };
    if wanted.is_empty() {
        return Err(invalid());
    }

    match port.lookup_symbol(wanted)? {
        Some(canonical) if canonical.eq_ignore_ascii_case(wanted) => Ok(()),
        _ => Err(invalid()),
    }
}

/// Fetch a series for `ticker` over exactly one of `period` or
/// `(start, end)`.
pub fn fetch_series(
    port: &dyn MarketDataPort,
    ticker: &str,
    period: Option<&str>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<TimeSeriesTable, StockDataError> {
    let query = Query::new(ticker, period, start, end)?;
    fetch_query(port, &query)
}

pub fn fetch_query(
    port: &dyn MarketDataPort,
    query: &Query,
) -> Result<TimeSeriesTable, StockDataError> {
    info!(ticker = query.ticker(), range = %query.range(), "fetching history");
    let bars = port.fetch_history(query)?;
    if bars.is_empty() {
        return Err(StockDataError::data_unavailable(
            query.ticker(),
            format!("provider returned no rows for {}", query.period_label()),
        ));
    }

    let table = TimeSeriesTable::new(query.ticker(), bars)?;
    info!(ticker = query.ticker(), rows = table.len(), "history loaded");
    Ok(table)
}
