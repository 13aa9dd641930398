//! CSV directory market data adapter.
//!
//! Serves `{dir}/{TICKER}.csv` files in the export layout, so a previous
//! export can be analysed again offline.

use crate::adapters::csv_export::import_csv;
use crate::domain::error::StockDataError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::query::{DataRange, PeriodSpan, Query};
use crate::ports::data_port::MarketDataPort;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker.to_uppercase()))
    }

    /// Tickers with a file in the directory, sorted.
    pub fn list_symbols(&self) -> Result<Vec<String>, StockDataError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| StockDataError::Provider {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StockDataError::Provider {
                reason: format!("directory entry error: {}", e),
            })?;
            let path = entry.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if let (true, Some(stem)) = (is_csv, path.file_stem()) {
                symbols.push(stem.to_string_lossy().to_uppercase());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

impl MarketDataPort for CsvAdapter {
    fn lookup_symbol(&self, symbol: &str) -> Result<Option<String>, StockDataError> {
        let wanted = symbol.trim().to_uppercase();
        Ok(self.list_symbols()?.into_iter().find(|s| *s == wanted))
    }

    fn fetch_history(&self, query: &Query) -> Result<Vec<OhlcvBar>, StockDataError> {
        let path = self.csv_path(query.ticker());
        if !path.exists() {
            return Err(StockDataError::data_unavailable(
                query.ticker(),
                format!("no file at {}", path.display()),
            ));
        }

        let table = import_csv(&path, query.ticker())?;
        let bars = table.bars();

        let selected: Vec<OhlcvBar> = match query.range() {
            DataRange::Dates { start, end } => bars
                .iter()
                .filter(|b| b.date >= *start && b.date < *end)
                .cloned()
                .collect(),
            DataRange::Period(token) => {
                let span = PeriodSpan::parse(token)?;
                match (span, table.last_date()) {
                    (_, None) => Vec::new(),
                    (PeriodSpan::Days(n), _) => {
                        let skip = bars.len().saturating_sub(n as usize);
                        bars[skip..].to_vec()
                    }
                    (span, Some(last)) => match span.start_date(last) {
                        Some(from) => bars.iter().filter(|b| b.date >= from).cloned().collect(),
                        None => bars.to_vec(),
                    },
                }
            }
        };

        tracing::debug!(
            ticker = query.ticker(),
            rows = selected.len(),
            path = %path.display(),
            "loaded rows from CSV"
        );
        Ok(selected)
    }
}
