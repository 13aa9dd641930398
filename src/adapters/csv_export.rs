//! CSV export and import of an enriched [`TimeSeriesTable`].
//!
//! Layout: `Date,Open,High,Low,Close,Volume` followed by the derived columns
//! in insertion order. Undefined derived values are written as empty fields.

use crate::adapters::atomic_file::write_atomically;
use crate::domain::error::StockDataError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::query::DATE_FORMAT;
use crate::domain::series::TimeSeriesTable;
use chrono::NaiveDate;
use std::path::Path;

pub const BASE_HEADER: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

/// Write `table` to `path`, replacing any existing file. The file appears
/// under its final name only once every row has been written.
pub fn export_csv(table: &TimeSeriesTable, path: &Path) -> Result<(), StockDataError> {
    write_atomically(path, |file| {
        let mut wtr = csv::Writer::from_writer(file);

        let mut header: Vec<&str> = BASE_HEADER.to_vec();
        header.extend(table.columns().iter().map(|c| c.name.as_str()));
        wtr.write_record(&header)?;

        for (i, bar) in table.bars().iter().enumerate() {
            let mut record = vec![
                bar.date.format(DATE_FORMAT).to_string(),
                bar.open.to_string(),
                bar.high.to_string(),
                bar.low.to_string(),
                bar.close.to_string(),
                bar.volume.to_string(),
            ];
            for column in table.columns() {
                record.push(column.values[i].map(|v| v.to_string()).unwrap_or_default());
            }
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    })?;
    tracing::info!(path = %path.display(), rows = table.len(), "exported CSV");
    Ok(())
}

/// Read a file in the export layout back into a table for `ticker`.
pub fn import_csv(path: &Path, ticker: &str) -> Result<TimeSeriesTable, StockDataError> {
    let mut rdr = csv::Reader::from_path(path)?;
    let headers = rdr.headers()?.clone();

    for (i, expected) in BASE_HEADER.iter().enumerate() {
        match headers.get(i) {
            Some(h) if h.trim().eq_ignore_ascii_case(expected) => {}
            _ => {
                return Err(StockDataError::data_unavailable(
                    ticker,
                    format!("{}: expected column {} at position {}", path.display(), expected, i + 1),
                ));
            }
        }
    }
    let derived: Vec<String> = headers
        .iter()
        .skip(BASE_HEADER.len())
        .map(|h| h.trim().to_string())
        .collect();

    let mut bars = Vec::new();
    let mut derived_values: Vec<Vec<Option<f64>>> = vec![Vec::new(); derived.len()];

    for result in rdr.records() {
        let record = result?;
        let field = |idx: usize| get_field(&record, &headers, idx, ticker);

        let date = NaiveDate::parse_from_str(field(0)?, DATE_FORMAT).map_err(|e| {
            StockDataError::data_unavailable(ticker, format!("invalid date format: {}", e))
        })?;

        bars.push(OhlcvBar {
            date,
            open: parse_price(ticker, "open", field(1)?)?,
            high: parse_price(ticker, "high", field(2)?)?,
            low: parse_price(ticker, "low", field(3)?)?,
            close: parse_price(ticker, "close", field(4)?)?,
            volume: parse_volume(ticker, field(5)?)?,
        });

        for (j, values) in derived_values.iter_mut().enumerate() {
            let raw = record.get(BASE_HEADER.len() + j).unwrap_or("").trim();
            let value = if raw.is_empty() {
                None
            } else {
                Some(parse_price(ticker, &derived[j], raw)?)
            };
            values.push(value);
        }
    }

    // Columns are aligned to file order, so sort rows the same way the
    // table will before attaching them.
    let mut order: Vec<usize> = (0..bars.len()).collect();
    order.sort_by_key(|&i| bars[i].date);

    let mut table = TimeSeriesTable::new(ticker, bars)?;
    for (name, values) in derived.iter().zip(derived_values) {
        let aligned = order.iter().map(|&i| values[i]).collect();
        table.set_column(name, aligned)?;
    }
    Ok(table)
}

fn get_field<'r>(
    record: &'r csv::StringRecord,
    headers: &csv::StringRecord,
    idx: usize,
    ticker: &str,
) -> Result<&'r str, StockDataError> {
    record.get(idx).map(str::trim).ok_or_else(|| {
        StockDataError::data_unavailable(
            ticker,
            format!("missing {} column", headers.get(idx).unwrap_or("unknown")),
        )
    })
}

fn parse_price(ticker: &str, name: &str, raw: &str) -> Result<f64, StockDataError> {
    raw.parse::<f64>().map_err(|e| {
        StockDataError::data_unavailable(ticker, format!("invalid {} value '{}': {}", name, raw, e))
    })
}

fn parse_volume(ticker: &str, raw: &str) -> Result<i64, StockDataError> {
    if let Ok(v) = raw.parse::<i64>() {
        return Ok(v);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
        _ => Err(StockDataError::data_unavailable(
            ticker,
            format!("invalid volume value '{}'", raw),
        )),
    }
}
