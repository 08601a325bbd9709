//! Indicator capability: the contract the generator requires from an
//! indicator library, plus the built-in reference catalog.
//!
//! An indicator is constructed by name, initialized for a slot kind (which
//! installs that kind's parameter domains), and calculated over a dataset.
//! Calculation resolves component series (an action series plus chart
//! overlays) and each component's first valid bar.

pub mod catalog;
pub mod math;

use thiserror::Error;

use crate::domain::Dataset;
use crate::params::ParamSet;
use crate::strategy::{ChartMeta, IndicatorComponent, SlotKind};

pub use catalog::BuiltinCatalog;

/// An indicator failed to calculate for specific parameters.
///
/// Recoverable at the search level: the indicator is blacklisted and the
/// candidate is rebuilt.
#[derive(Debug, Clone, Error)]
#[error("indicator '{indicator}' failed on {kind:?} slot: {message}")]
pub struct CalculationFault {
    pub indicator: String,
    pub kind: SlotKind,
    pub message: String,
}

/// Requested indicator name is not in the provider's catalog.
#[derive(Debug, Clone, Error)]
#[error("unknown indicator '{0}'")]
pub struct UnknownIndicator(pub String);

/// One indicator instance bound to a slot kind.
pub trait Indicator: Send {
    fn name(&self) -> &str;

    /// Slot kinds this indicator can occupy.
    fn supported_kinds(&self) -> &[SlotKind];

    /// Whether the generator may pick this indicator at all.
    fn is_generatable(&self) -> bool {
        true
    }

    /// For exit signals: whether exit filters may follow this indicator.
    fn supports_exit_filters(&self) -> bool {
        false
    }

    /// Meaningless on day/week granularity; excluded upstream there.
    fn intraday_only(&self) -> bool {
        false
    }

    /// Install the parameter domains for a slot kind.
    fn initialize(&mut self, kind: SlotKind);

    /// The slot kind this instance was initialized for.
    fn kind(&self) -> SlotKind;

    fn params(&self) -> &ParamSet;

    fn params_mut(&mut self) -> &mut ParamSet;

    fn set_params(&mut self, params: ParamSet) {
        *self.params_mut() = params;
    }

    /// Compute component series over the dataset.
    fn calculate(&mut self, dataset: &Dataset) -> Result<(), CalculationFault>;

    /// Components resolved by the last successful `calculate`.
    fn components(&self) -> &[IndicatorComponent];

    /// Chart-display metadata for the current parameters.
    fn chart_meta(&self) -> ChartMeta {
        ChartMeta::default()
    }

    /// Earliest bar at which every component is valid.
    fn first_valid_bar(&self) -> usize {
        self.components()
            .iter()
            .map(|c| c.first_valid_bar)
            .max()
            .unwrap_or(0)
    }
}

/// Constructs indicators by name.
pub trait IndicatorProvider: Send + Sync {
    fn names(&self) -> Vec<String>;

    fn construct(&self, name: &str) -> Result<Box<dyn Indicator>, UnknownIndicator>;
}

/// Build a synthetic dataset from close prices for tests.
///
/// Open = previous close, high/low bracket the body by 0.5, hourly bars.
#[cfg(test)]
pub fn make_dataset(closes: &[f64]) -> Dataset {
    use crate::domain::{Bar, Granularity};
    use chrono::{Duration, NaiveDate};

    let start = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                time: start + Duration::hours(i as i64),
                open,
                high: open.max(close) + 0.5,
                low: open.min(close) - 0.5,
                close,
                volume: 1_000,
            }
        })
        .collect();
    Dataset::new("TEST", Granularity::Hour, bars)
}
