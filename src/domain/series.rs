//! Time series table: OHLCV bars plus derived indicator columns.
//!
//! Bars are kept in strictly increasing date order. Derived columns are
//! aligned 1:1 with the bars; `None` marks an undefined value (warmup).

use crate::domain::error::StockDataError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone)]
pub struct TimeSeriesTable {
    ticker: String,
    bars: Vec<OhlcvBar>,
    columns: Vec<Column>,
}

impl TimeSeriesTable {
    /// Sorts `bars` by date and rejects duplicate dates or malformed rows.
    pub fn new(ticker: &str, mut bars: Vec<OhlcvBar>) -> Result<Self, StockDataError> {
        bars.sort_by_key(|b| b.date);

        if let Some(bad) = bars.iter().find(|b| !b.is_well_formed()) {
            return Err(StockDataError::data_unavailable(
                ticker,
                format!("malformed row on {}", bad.date),
            ));
        }
        if let Some(pair) = bars.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(StockDataError::data_unavailable(
                ticker,
                format!("duplicate row for {}", pair[0].date),
            ));
        }

        Ok(Self {
            ticker: ticker.to_string(),
            bars,
            columns: Vec::new(),
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Derived columns in insertion order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Most recent defined value of a column.
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.column(name)?.iter().rev().find_map(|v| *v)
    }

    /// Assign a derived column. An existing column of the same name is
    /// replaced in place; new names are appended.
    pub fn set_column(
        &mut self,
        name: &str,
        values: Vec<Option<f64>>,
    ) -> Result<(), StockDataError> {
        if values.len() != self.bars.len() {
            return Err(StockDataError::configuration(format!(
                "column {} has {} values but the table has {} rows",
                name,
                values.len(),
                self.bars.len()
            )));
        }

        tracing::debug!(ticker = %self.ticker, column = name, "setting column");
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column {
                name: name.to_string(),
                values,
            }),
        }
        Ok(())
    }
}
