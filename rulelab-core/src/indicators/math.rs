//! Numeric primitives shared by the indicator catalog.
//!
//! Every function takes a full series and returns a series of the same
//! length with `f64::NAN` over the warmup prefix.

use crate::domain::{Bar, Dataset};

/// Extract the price series named by a "Base price" choice.
///
/// Unknown names fall back to Close.
pub fn price_series(dataset: &Dataset, base: &str) -> Vec<f64> {
    let pick: fn(&Bar) -> f64 = match base {
        "Open" => |b| b.open,
        "High" => |b| b.high,
        "Low" => |b| b.low,
        "Median" => |b| (b.high + b.low) / 2.0,
        _ => |b| b.close,
    };
    dataset.bars.iter().map(pick).collect()
}

/// Simple moving average. First valid value at index `period - 1`.
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    let period = period.max(1);
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if n < period {
        return result;
    }
    let mut sum: f64 = values[..period].iter().sum();
    result[period - 1] = sum / period as f64;
    for i in period..n {
        sum += values[i] - values[i - period];
        result[i] = sum / period as f64;
    }
    result
}

/// Exponential moving average seeded with the SMA of the first window.
/// First valid value at index `period - 1`.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let period = period.max(1);
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if n < period {
        return result;
    }
    let k = 2.0 / (period as f64 + 1.0);
    let seed: f64 = values[..period].iter().sum::<f64>() / period as f64;
    result[period - 1] = seed;
    for i in period..n {
        result[i] = values[i] * k + result[i - 1] * (1.0 - k);
    }
    result
}

/// Relative Strength Index with Wilder smoothing.
/// First valid value at index `period`.
pub fn rsi(values: &[f64], period: usize) -> Vec<f64> {
    let period = period.max(1);
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if n < period + 1 {
        return result;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let change = values[i] - values[i - 1];
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss -= change;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    result[period] = rsi_value(avg_gain, avg_loss);

    for i in (period + 1)..n {
        let change = values[i] - values[i - 1];
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
        result[i] = rsi_value(avg_gain, avg_loss);
    }
    result
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss <= 0.0 {
        if avg_gain <= 0.0 {
            50.0
        } else {
            100.0
        }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// Momentum: `v[i] - v[i - period]`. First valid value at index `period`.
pub fn momentum(values: &[f64], period: usize) -> Vec<f64> {
    let period = period.max(1);
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    for i in period..n {
        result[i] = values[i] - values[i - period];
    }
    result
}

/// Index of the first finite value, or `len` when the series never
/// becomes valid.
pub fn first_valid(values: &[f64]) -> usize {
    values
        .iter()
        .position(|v| v.is_finite())
        .unwrap_or(values.len())
}
