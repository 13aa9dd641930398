//! Chart rendering port trait.

use crate::domain::error::StockDataError;
use crate::domain::series::TimeSeriesTable;
use std::path::Path;

/// Everything a renderer needs to persist one chart.
pub struct ChartRequest<'a> {
    pub table: &'a TimeSeriesTable,
    pub ticker: &'a str,
    pub period_label: &'a str,
    pub output_path: &'a Path,
    pub style: &'a str,
}

pub trait ChartPort {
    /// Style names this renderer can draw.
    fn available_styles(&self) -> Vec<String>;

    fn render(&self, request: &ChartRequest<'_>) -> Result<(), StockDataError>;
}
