//! CSV bar loading.
//!
//! Expected header: `open_time,open,high,low,close,volume` with `open_time`
//! in epoch milliseconds. The loader is strict: an empty file, a bar that
//! fails the sanity check, or timestamps that do not strictly increase all
//! reject the whole file — a malformed series would silently poison every
//! figure downstream.

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use quantlab_core::domain::PriceBar;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open bar file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("bar file contains no rows")]
    Empty,
    #[error("bar {index} fails the sanity check (non-finite or inverted OHLC)")]
    InsaneBar { index: usize },
    #[error("open_time does not strictly increase at row {index}")]
    NonMonotoneTimestamps { index: usize },
}

pub fn load_bars(path: &Path) -> Result<Vec<PriceBar>, LoadError> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);

    let mut bars = Vec::new();
    for (index, row) in reader.deserialize::<PriceBar>().enumerate() {
        let bar = row?;
        if !bar.is_sane() {
            return Err(LoadError::InsaneBar { index });
        }
        if bars
            .last()
            .is_some_and(|prev: &PriceBar| bar.open_time <= prev.open_time)
        {
            return Err(LoadError::NonMonotoneTimestamps { index });
        }
        bars.push(bar);
    }
    if bars.is_empty() {
        return Err(LoadError::Empty);
    }
    info!(rows = bars.len(), path = %path.display(), "loaded bar series");
    Ok(bars)
}

/// Keep only bars inside the inclusive date window. `None` bounds are open.
pub fn clip_to_window(
    bars: Vec<PriceBar>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<PriceBar> {
    let start_ms = start.and_then(day_start_ms);
    let end_ms = end.and_then(day_end_ms);
    bars.into_iter()
        .filter(|bar| {
            start_ms.map_or(true, |s| bar.open_time >= s)
                && end_ms.map_or(true, |e| bar.open_time <= e)
        })
        .collect()
}

fn day_start_ms(date: NaiveDate) -> Option<i64> {
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}

fn day_end_ms(date: NaiveDate) -> Option<i64> {
    Some(date.and_hms_opt(23, 59, 59)?.and_utc().timestamp_millis())
}
