//! Integration tests for the analysis pipeline.
//!
//! Tests cover:
//! - Fetch, enrich and analyse through a mock data port
//! - The AAPL / 5d end-to-end scenario
//! - Export then re-import through the CSV data adapter
//! - Chart files written by the PNG renderer
//! - Failure paths leave no export or chart behind

mod common;

use approx::assert_relative_eq;
use common::*;
use std::fs;
use stockscope::adapters::csv_adapter::CsvAdapter;
use stockscope::adapters::csv_export::{export_csv, import_csv};
use stockscope::adapters::png_chart_adapter::PngChartAdapter;
use stockscope::domain::analysis::{average_close, FluctuationThreshold};
use stockscope::domain::error::StockDataError;
use stockscope::domain::indicator::{ema_column, MACD, MOVING_AVERAGE, RSI, SIGNAL_LINE};
use stockscope::domain::market_data::{fetch_series, validate_ticker};
use stockscope::domain::query::{DataRange, Query};
use stockscope::domain::settings::Settings;
use stockscope::driver::Session;
use tempfile::TempDir;

mod full_pipeline {
    use super::*;

    #[test]
    fn aapl_five_days_end_to_end() {
        let port = MockDataPort::new().with_bars("AAPL", aapl_week());
        let chart = RecordingChartPort::new();
        let settings = Settings::default();
        let session = Session::new(&port, &chart, &settings);

        let query = Query::period("aapl", "5d").unwrap();
        let analysis = session.analyze(&query, None).unwrap();
        let table = &analysis.table;

        assert_eq!(table.len(), 5);
        let ma = table.column(MOVING_AVERAGE).unwrap();
        assert!(ma[..4].iter().all(Option::is_none));
        assert_relative_eq!(ma[4].unwrap(), 195.124, epsilon = 1e-9);

        let rsi = table.column(RSI).unwrap();
        assert!(rsi.iter().all(Option::is_none));

        let macd = table.column(MACD).unwrap();
        assert!(macd.iter().all(Option::is_some));
        assert_eq!(macd[0], Some(0.0));
        assert!(table.column(SIGNAL_LINE).unwrap().iter().all(Option::is_some));

        assert_relative_eq!(analysis.summary.average_close, 195.124, epsilon = 1e-9);
        assert!(analysis.fluctuations.is_empty());
        assert_eq!(analysis.summary.latest_rsi, None);

        let chart_path = session.render_chart(&analysis, "classic").unwrap();
        assert!(chart_path.ends_with("AAPL_5d.png"));

        let calls = chart.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].ticker, "AAPL");
        assert_eq!(calls[0].period_label, "5d");
        assert_eq!(calls[0].rows, 5);
        assert_eq!(
            calls[0].columns,
            vec![
                MOVING_AVERAGE.to_string(),
                RSI.to_string(),
                ema_column(12),
                ema_column(26),
                MACD.to_string(),
                SIGNAL_LINE.to_string(),
            ]
        );
    }

    #[test]
    fn fluctuations_respect_threshold() {
        let port = MockDataPort::new().with_bars("AAPL", aapl_week());
        let chart = RecordingChartPort::new();
        let settings = Settings::default();
        let session = Session::new(&port, &chart, &settings);
        let query = Query::period("AAPL", "5d").unwrap();

        let strong = session
            .analyze(&query, Some(FluctuationThreshold::new(1.0).unwrap()))
            .unwrap();
        assert_eq!(strong.fluctuations.len(), 1);
        assert_eq!(strong.fluctuations[0].date, date(2024, 6, 7));
        assert_relative_eq!(
            strong.fluctuations[0].pct_change,
            (196.89 - 194.48) / 194.48 * 100.0,
            epsilon = 1e-9
        );

        let every_move = session
            .analyze(&query, Some(FluctuationThreshold::new(0.0).unwrap()))
            .unwrap();
        assert_eq!(every_move.fluctuations.len(), 4);
        assert!(every_move
            .fluctuations
            .windows(2)
            .all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn date_range_query_reaches_provider() {
        let port = MockDataPort::new().with_bars("MSFT", bars_from_closes("2024-01-02", &[1.0, 2.0]));
        let table = fetch_series(
            &port,
            "msft",
            None,
            Some(date(2024, 1, 1)),
            Some(date(2024, 2, 1)),
        )
        .unwrap();

        assert_eq!(table.ticker(), "MSFT");
        let queries = port.queries.borrow();
        assert_eq!(
            queries[0].range(),
            &DataRange::Dates {
                start: date(2024, 1, 1),
                end: date(2024, 2, 1)
            }
        );
    }

    #[test]
    fn custom_windows_from_settings() {
        let closes: Vec<f64> = (1..=30).map(|i| 100.0 + (i % 4) as f64).collect();
        let port = MockDataPort::new().with_bars("BHP", bars_from_closes("2024-01-01", &closes));
        let chart = RecordingChartPort::new();
        let mut settings = Settings::default();
        settings.indicators.ma_window = 3;
        settings.indicators.rsi_window = 7;
        let session = Session::new(&port, &chart, &settings);

        let analysis = session
            .analyze(&Query::period("BHP", "1mo").unwrap(), None)
            .unwrap();

        let ma = analysis.table.column(MOVING_AVERAGE).unwrap();
        assert!(ma[1].is_none());
        assert!(ma[2].is_some());
        let rsi = analysis.table.column(RSI).unwrap();
        assert!(rsi[6].is_none());
        assert!(rsi[7].is_some());
        let latest = analysis.summary.latest_rsi.unwrap();
        assert!((0.0..=100.0).contains(&latest));
    }
}

mod failure_paths {
    use super::*;

    #[test]
    fn empty_history_is_unavailable() {
        let port = MockDataPort::new().with_bars("AAPL", vec![]);
        let chart = RecordingChartPort::new();
        let settings = Settings::default();
        let session = Session::new(&port, &chart, &settings);

        let err = session
            .analyze(&Query::period("AAPL", "5d").unwrap(), None)
            .unwrap_err();
        assert!(matches!(err, StockDataError::DataUnavailable { .. }));
        assert!(chart.calls.borrow().is_empty());
    }

    #[test]
    fn provider_failure_propagates() {
        let port = MockDataPort::new()
            .with_bars("AAPL", aapl_week())
            .with_fetch_error("AAPL", "connection reset");
        let chart = RecordingChartPort::new();
        let settings = Settings::default();
        let session = Session::new(&port, &chart, &settings);

        let err = session
            .analyze(&Query::period("AAPL", "5d").unwrap(), None)
            .unwrap_err();
        assert!(matches!(err, StockDataError::Provider { .. }));
    }

    #[test]
    fn validation_treats_provider_errors_as_invalid() {
        let port = MockDataPort::new()
            .with_bars("AAPL", aapl_week())
            .with_lookup_error("MSFT", "timeout");
        assert!(validate_ticker(&port, "aapl"));
        assert!(!validate_ticker(&port, "ZZZZ"));
        assert!(!validate_ticker(&port, "MSFT"));
        assert!(!validate_ticker(&port, ""));
    }

    #[test]
    fn average_of_empty_table_is_error() {
        let table = stockscope::domain::series::TimeSeriesTable::new("AAPL", vec![]).unwrap();
        assert!(matches!(
            average_close(&table),
            Err(StockDataError::EmptyData)
        ));
    }
}

mod csv_round_trip {
    use super::*;

    #[test]
    fn export_then_import_preserves_table() {
        let dir = TempDir::new().unwrap();
        let port = MockDataPort::new().with_bars("AAPL", aapl_week());
        let chart = RecordingChartPort::new();
        let settings = Settings::default();
        let session = Session::new(&port, &chart, &settings);
        let analysis = session
            .analyze(&Query::period("AAPL", "5d").unwrap(), None)
            .unwrap();

        let path = dir.path().join("aapl.csv");
        session.export(&analysis, &path).unwrap();
        let imported = import_csv(&path, "AAPL").unwrap();

        assert_eq!(imported.bars(), analysis.table.bars());
        assert_eq!(imported.columns(), analysis.table.columns());
    }

    #[test]
    fn export_header_lists_derived_columns() {
        let dir = TempDir::new().unwrap();
        let port = MockDataPort::new().with_bars("AAPL", aapl_week());
        let chart = RecordingChartPort::new();
        let settings = Settings::default();
        let session = Session::new(&port, &chart, &settings);
        let analysis = session
            .analyze(&Query::period("AAPL", "5d").unwrap(), None)
            .unwrap();

        let path = dir.path().join("out.csv");
        export_csv(&analysis.table, &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap();
        assert_eq!(
            header,
            "Date,Open,High,Low,Close,Volume,Moving_Average,RSI,EMA_12,EMA_26,MACD,Signal_Line"
        );
        assert_eq!(content.lines().count(), 6);
    }

    #[test]
    fn csv_adapter_serves_exported_files() {
        let dir = TempDir::new().unwrap();
        let mock = MockDataPort::new().with_bars("AAPL", aapl_week());
        let chart = RecordingChartPort::new();
        let settings = Settings::default();

        let analysis = Session::new(&mock, &chart, &settings)
            .analyze(&Query::period("AAPL", "5d").unwrap(), None)
            .unwrap();
        export_csv(&analysis.table, &dir.path().join("AAPL.csv")).unwrap();

        let offline = CsvAdapter::new(dir.path().to_path_buf());
        let session = Session::new(&offline, &chart, &settings);
        session.check("aapl").unwrap();
        let again = session
            .analyze(&Query::period("AAPL", "3d").unwrap(), None)
            .unwrap();

        assert_eq!(again.table.len(), 3);
        assert_eq!(again.table.first_date(), Some(date(2024, 6, 5)));
        assert_eq!(again.table.bars(), &analysis.table.bars()[2..]);
    }
}

mod png_chart {
    use super::*;

    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

    #[test]
    fn period_chart_saved_as_png() {
        let dir = TempDir::new().unwrap();
        let port = MockDataPort::new().with_bars("AAPL", aapl_week());
        let chart = PngChartAdapter::new(900, 450);
        let mut settings = Settings::default();
        settings.chart.output_dir = dir.path().to_path_buf();
        let session = Session::new(&port, &chart, &settings);

        let analysis = session
            .analyze(&Query::period("AAPL", "5d").unwrap(), None)
            .unwrap();
        let path = session.render_chart(&analysis, "classic").unwrap();

        assert_eq!(path, dir.path().join("AAPL_5d.png"));
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(PNG_SIGNATURE));
    }

    #[test]
    fn date_range_chart_name() {
        let dir = TempDir::new().unwrap();
        let port = MockDataPort::new().with_bars("AAPL", aapl_week());
        let chart = PngChartAdapter::new(800, 400);
        let mut settings = Settings::default();
        settings.chart.output_dir = dir.path().to_path_buf();
        let session = Session::new(&port, &chart, &settings);

        let query = Query::dates("AAPL", date(2024, 6, 3), date(2024, 6, 8)).unwrap();
        let analysis = session.analyze(&query, None).unwrap();
        let path = session.render_chart(&analysis, "bmh").unwrap();

        assert_eq!(path, dir.path().join("AAPL_2024-06-03_to_2024-06-08.png"));
        assert!(fs::read(&path).unwrap().starts_with(PNG_SIGNATURE));

        let svg = chart
            .render_to_svg(&stockscope::ports::chart_port::ChartRequest {
                table: &analysis.table,
                ticker: "AAPL",
                period_label: &query.period_label(),
                output_path: &path,
                style: "bmh",
            })
            .unwrap();
        assert!(svg.contains("AAPL Stock Price (2024-06-03 to 2024-06-08)"));
        assert!(svg.contains("Moving_Average"));
    }
}
