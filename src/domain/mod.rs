//! Core domain types and logic.

pub mod analysis;
pub mod error;
pub mod indicator;
pub mod market_data;
pub mod ohlcv;
pub mod query;
pub mod series;
pub mod settings;
pub mod style;
