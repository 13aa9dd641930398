//! Yahoo Finance chart API adapter.
//!
//! Talks to `GET {base}/v8/finance/chart/{symbol}` with `interval=1d` and
//! either `range={period}` or `period1`/`period2` epoch seconds. Rows with no
//! close are dropped and timestamps are shifted into the exchange's local
//! time before taking the calendar date.

use crate::domain::error::StockDataError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::query::{DataRange, Query};
use crate::domain::settings::ProviderSettings;
use crate::ports::data_port::MarketDataPort;
use chrono::{DateTime, NaiveDate, NaiveTime};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    symbol: String,
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Decoded chart payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartOutcome {
    Found { symbol: String, bars: Vec<OhlcvBar> },
    NotFound { reason: String },
}

pub struct YahooAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooAdapter {
    pub fn new(settings: &ProviderSettings) -> Result<Self, StockDataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| StockDataError::Provider {
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, symbol)
    }

    fn get_chart(
        &self,
        symbol: &str,
        params: &[(&'static str, String)],
    ) -> Result<ChartOutcome, StockDataError> {
        let url = self.chart_url(symbol);
        debug!(%url, ?params, "requesting chart");

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .map_err(|e| StockDataError::Provider {
                reason: format!("request to {} failed: {}", url, e),
            })?;

        let status = response.status();
        let body = response.text().map_err(|e| StockDataError::Provider {
            reason: format!("failed to read response body: {}", e),
        })?;

        match parse_chart(symbol, &body) {
            Ok(outcome) => Ok(outcome),
            Err(_) if !status.is_success() => Err(StockDataError::Provider {
                reason: format!("HTTP {} from {}", status, url),
            }),
            Err(e) => Err(e),
        }
    }
}

/// Query string for a history request.
pub fn history_params(range: &DataRange) -> Vec<(&'static str, String)> {
    let mut params = match range {
        DataRange::Period(p) => vec![("range", p.clone())],
        DataRange::Dates { start, end } => vec![
            ("period1", epoch_seconds(*start).to_string()),
            ("period2", epoch_seconds(*end).to_string()),
        ],
    };
    params.push(("interval", "1d".to_string()));
    params.push(("includePrePost", "false".to_string()));
    params
}

fn epoch_seconds(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Decode a chart response body. Provider error payloads become
/// [`ChartOutcome::NotFound`]; undecodable bodies are `DataUnavailable`.
pub fn parse_chart(symbol: &str, body: &str) -> Result<ChartOutcome, StockDataError> {
    let envelope: ChartEnvelope = serde_json::from_str(body).map_err(|e| {
        StockDataError::data_unavailable(symbol, format!("malformed provider response: {}", e))
    })?;

    if let Some(err) = envelope.chart.error {
        return Ok(ChartOutcome::NotFound {
            reason: match err.description {
                Some(d) => format!("{}: {}", err.code, d),
                None => err.code,
            },
        });
    }

    let result = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| StockDataError::data_unavailable(symbol, "response has no result"))?;

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let offset = result.meta.gmtoffset;

    // Keyed by date so a repeated trading day keeps its latest row.
    let mut rows: BTreeMap<NaiveDate, OhlcvBar> = BTreeMap::new();
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let Some(close) = quote.close.get(i).copied().flatten() else {
            continue;
        };
        let Some(local) = DateTime::from_timestamp(ts + offset, 0) else {
            return Err(StockDataError::data_unavailable(
                symbol,
                format!("timestamp {} out of range", ts),
            ));
        };
        let pick = |series: &[Option<f64>]| series.get(i).copied().flatten().unwrap_or(close);
        let date = local.date_naive();

        rows.insert(
            date,
            OhlcvBar {
                date,
                open: pick(&quote.open),
                high: pick(&quote.high),
                low: pick(&quote.low),
                close,
                volume: quote
                    .volume
                    .get(i)
                    .copied()
                    .flatten()
                    .map(|v| v.round() as i64)
                    .unwrap_or(0),
            },
        );
    }

    Ok(ChartOutcome::Found {
        symbol: result.meta.symbol,
        bars: rows.into_values().collect(),
    })
}

impl MarketDataPort for YahooAdapter {
    fn lookup_symbol(&self, symbol: &str) -> Result<Option<String>, StockDataError> {
        let symbol = symbol.trim();
        if symbol.is_empty() || symbol.contains(['/', '?', '#', ' ']) {
            return Ok(None);
        }

        let params = [
            ("range", "1d".to_string()),
            ("interval", "1d".to_string()),
        ];
        match self.get_chart(symbol, &params)? {
            ChartOutcome::Found { symbol, .. } => Ok(Some(symbol)),
            ChartOutcome::NotFound { reason } => {
                debug!(symbol, %reason, "symbol not found");
                Ok(None)
            }
        }
    }

    fn fetch_history(&self, query: &Query) -> Result<Vec<OhlcvBar>, StockDataError> {
        match self.get_chart(query.ticker(), &history_params(query.range()))? {
            ChartOutcome::Found { bars, .. } => {
                info!(ticker = query.ticker(), rows = bars.len(), "received history");
                Ok(bars)
            }
            ChartOutcome::NotFound { reason } => {
                Err(StockDataError::data_unavailable(query.ticker(), reason))
            }
        }
    }
}
