//! CSV dataset ingestion.
//!
//! Expects a header row of `time,open,high,low,close,volume`. Timestamps
//! accept `%Y-%m-%d %H:%M:%S`, `%Y-%m-%dT%H:%M:%S` or a bare date.
//! Rows must be sane OHLC and strictly ascending in time.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{Bar, Dataset, Granularity};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("row {row}: {message}")]
    InvalidRow { row: usize, message: String },
    #[error("dataset '{0}' contains no bars")]
    Empty(String),
}

#[derive(Debug, Deserialize)]
struct RawRow {
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

fn parse_time(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Load an OHLCV dataset from a CSV file.
pub fn load_csv(
    path: &Path,
    symbol: &str,
    granularity: Granularity,
) -> Result<Dataset, LoadError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| LoadError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let mut bars: Vec<Bar> = Vec::new();
    for (i, record) in reader.deserialize::<RawRow>().enumerate() {
        // Header is row 1.
        let row = i + 2;
        let raw = record.map_err(|e| LoadError::InvalidRow {
            row,
            message: e.to_string(),
        })?;
        let time = parse_time(&raw.time).ok_or_else(|| LoadError::InvalidRow {
            row,
            message: format!("unparsable timestamp '{}'", raw.time),
        })?;
        let bar = Bar {
            time,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
        };
        if !bar.is_sane() {
            return Err(LoadError::InvalidRow {
                row,
                message: "inconsistent OHLC values".into(),
            });
        }
        if let Some(prev) = bars.last() {
            if bar.time <= prev.time {
                return Err(LoadError::InvalidRow {
                    row,
                    message: format!("timestamp {} is not ascending", bar.time),
                });
            }
        }
        bars.push(bar);
    }

    if bars.is_empty() {
        return Err(LoadError::Empty(symbol.to_string()));
    }
    Ok(Dataset::new(symbol, granularity, bars))
}
