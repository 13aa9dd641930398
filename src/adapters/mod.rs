//! Concrete adapter implementations for ports.

pub mod atomic_file;
pub mod csv_adapter;
pub mod csv_export;
pub mod file_config_adapter;
pub mod png_chart_adapter;
pub mod yahoo_adapter;
