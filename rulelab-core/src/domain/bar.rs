//! Bar and dataset — the fundamental market data units.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// OHLCV bar for a single instrument at a single point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Basic OHLC sanity check: high is the top, low is the bottom,
    /// prices are positive and finite.
    pub fn is_sane(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.low > 0.0
    }

    /// Hour of day, used by time-window indicators.
    pub fn hour(&self) -> u32 {
        self.time.hour()
    }
}

/// Data granularity of a dataset.
///
/// Some indicators are meaningless on coarse-grained data (a time-of-day
/// window on daily bars, for example) and are excluded upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    Minute,
    Hour,
    Day,
    Week,
}

impl Granularity {
    /// True for granularities finer than one day.
    pub fn is_intraday(&self) -> bool {
        matches!(self, Self::Minute | Self::Hour)
    }

    /// Approximate number of bars in a trading year, used to annualize
    /// profit figures.
    pub fn bars_per_year(&self) -> f64 {
        match self {
            Self::Minute => 252.0 * 24.0 * 60.0,
            Self::Hour => 252.0 * 24.0,
            Self::Day => 252.0,
            Self::Week => 52.0,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Minute => "m1",
            Self::Hour => "h1",
            Self::Day => "d1",
            Self::Week => "w1",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "m1" | "minute" => Ok(Self::Minute),
            "h1" | "hour" => Ok(Self::Hour),
            "d1" | "day" => Ok(Self::Day),
            "w1" | "week" => Ok(Self::Week),
            other => Err(format!("unknown granularity '{other}'")),
        }
    }
}

/// An ordered, time-indexed series of bars for one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub symbol: String,
    pub granularity: Granularity,
    pub bars: Vec<Bar>,
}

impl Dataset {
    pub fn new(symbol: impl Into<String>, granularity: Granularity, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            granularity,
            bars,
        }
    }

    /// Bar-count bound used for lookback clamping.
    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
