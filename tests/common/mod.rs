#![allow(dead_code)]

use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::PathBuf;
use stockscope::domain::error::StockDataError;
pub use stockscope::domain::ohlcv::OhlcvBar;
use stockscope::domain::query::Query;
use stockscope::driver::Console;
use stockscope::ports::chart_port::{ChartPort, ChartRequest};
use stockscope::ports::data_port::MarketDataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub lookup_errors: HashMap<String, String>,
    pub fetch_errors: HashMap<String, String>,
    pub queries: RefCell<Vec<Query>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            lookup_errors: HashMap::new(),
            fetch_errors: HashMap::new(),
            queries: RefCell::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_lookup_error(mut self, ticker: &str, reason: &str) -> Self {
        self.lookup_errors
            .insert(ticker.to_string(), reason.to_string());
        self
    }

    pub fn with_fetch_error(mut self, ticker: &str, reason: &str) -> Self {
        self.fetch_errors
            .insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl MarketDataPort for MockDataPort {
    fn lookup_symbol(&self, symbol: &str) -> Result<Option<String>, StockDataError> {
        let symbol = symbol.to_uppercase();
        if let Some(reason) = self.lookup_errors.get(&symbol) {
            return Err(StockDataError::Provider {
                reason: reason.clone(),
            });
        }
        Ok(self.data.contains_key(&symbol).then_some(symbol))
    }

    fn fetch_history(&self, query: &Query) -> Result<Vec<OhlcvBar>, StockDataError> {
        self.queries.borrow_mut().push(query.clone());
        if let Some(reason) = self.fetch_errors.get(query.ticker()) {
            return Err(StockDataError::Provider {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(query.ticker()).cloned().unwrap_or_default())
    }
}

/// What a [`RecordingChartPort`] was asked to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCall {
    pub ticker: String,
    pub period_label: String,
    pub output_path: PathBuf,
    pub style: String,
    pub rows: usize,
    pub columns: Vec<String>,
}

pub struct RecordingChartPort {
    pub styles: Vec<String>,
    pub calls: RefCell<Vec<RenderCall>>,
    pub fail_with: Option<String>,
}

impl RecordingChartPort {
    pub fn new() -> Self {
        Self {
            styles: ["classic", "ggplot", "bmh", "xkcd"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            calls: RefCell::new(Vec::new()),
            fail_with: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            fail_with: Some(reason.to_string()),
            ..Self::new()
        }
    }
}

impl ChartPort for RecordingChartPort {
    fn available_styles(&self) -> Vec<String> {
        self.styles.clone()
    }

    fn render(&self, request: &ChartRequest<'_>) -> Result<(), StockDataError> {
        if let Some(reason) = &self.fail_with {
            return Err(StockDataError::Io(std::io::Error::other(reason.clone())));
        }
        self.calls.borrow_mut().push(RenderCall {
            ticker: request.ticker.to_string(),
            period_label: request.period_label.to_string(),
            output_path: request.output_path.to_path_buf(),
            style: request.style.to_string(),
            rows: request.table.len(),
            columns: request
                .table
                .columns()
                .iter()
                .map(|c| c.name.clone())
                .collect(),
        });
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000,
    }
}

/// One bar per calendar day starting at `start_date` with the given closes.
pub fn bars_from_closes(start_date: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000_000 + i as i64,
        })
        .collect()
}

/// Five trading days of AAPL, 2024-06-03 to 2024-06-07.
pub fn aapl_week() -> Vec<OhlcvBar> {
    vec![
        make_bar("2024-06-03", 194.03),
        make_bar("2024-06-04", 194.35),
        make_bar("2024-06-05", 195.87),
        make_bar("2024-06-06", 194.48),
        make_bar("2024-06-07", 196.89),
    ]
}

pub type ScriptedConsole = Console<Cursor<Vec<u8>>, Vec<u8>>;

/// Console whose input is `lines`, one answer per line.
pub fn scripted_console(lines: &[&str]) -> ScriptedConsole {
    let mut script = lines.join("\n");
    if !lines.is_empty() {
        script.push('\n');
    }
    Console::new(Cursor::new(script.into_bytes()), Vec::new())
}

pub fn console_output(console: ScriptedConsole) -> String {
    String::from_utf8(console.into_output()).unwrap()
}
