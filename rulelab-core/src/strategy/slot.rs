//! Strategy slots — one rule position in a configuration.

use serde::{Deserialize, Serialize};

use crate::params::ParamSet;

/// The role a slot plays in a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotKind {
    EntrySignal,
    EntryFilter,
    ExitSignal,
    ExitFilter,
}

impl SlotKind {
    pub fn is_entry(&self) -> bool {
        matches!(self, Self::EntrySignal | Self::EntryFilter)
    }

    pub fn is_filter(&self) -> bool {
        matches!(self, Self::EntryFilter | Self::ExitFilter)
    }
}

/// Whether the generator may touch a slot.
///
/// Locked slots are copied verbatim; linked slots keep their indicator but
/// re-randomize parameters; open slots are fully resampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SlotStatus {
    #[default]
    Open,
    Locked,
    Linked,
}

/// One computed output series of an indicator.
///
/// `values` semantics depend on the slot kind: entry signals use +1/-1/0
/// (long/short/none), filters and exits use 1/0 (fire/idle). The component
/// at index 0 is the action series; further components are chart overlays.
#[derive(Debug, Clone, Default)]
pub struct IndicatorComponent {
    pub name: String,
    pub first_valid_bar: usize,
    pub values: Vec<f64>,
}

/// Chart-display metadata resolved alongside the component data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartMeta {
    pub separate_pane: bool,
    pub min_value: f64,
    pub max_value: f64,
    pub special_values: Vec<f64>,
}

/// One position in a strategy: an indicator, its parameters, and the
/// resolved component data.
///
/// Component series are recomputed from the parameters on demand, so they
/// are skipped on serialization and excluded from fingerprints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotSpec {
    pub index: usize,
    pub kind: SlotKind,
    pub status: SlotStatus,
    pub group: String,
    pub indicator: String,
    pub params: ParamSet,
    #[serde(skip)]
    pub components: Vec<IndicatorComponent>,
    #[serde(skip)]
    pub chart: ChartMeta,
    pub is_defined: bool,
}

impl SlotSpec {
    /// Skeleton slot with no indicator assigned yet.
    pub fn new(index: usize, kind: SlotKind) -> Self {
        Self {
            index,
            kind,
            status: SlotStatus::Open,
            group: String::new(),
            indicator: String::new(),
            params: ParamSet::default(),
            components: Vec::new(),
            chart: ChartMeta::default(),
            is_defined: false,
        }
    }

    /// Earliest bar at which every component of this slot is valid.
    pub fn first_valid_bar(&self) -> usize {
        self.components
            .iter()
            .map(|c| c.first_valid_bar)
            .max()
            .unwrap_or(0)
    }

    /// Action-series value at a bar (component 0), 0.0 when undefined.
    pub fn action(&self, bar: usize) -> f64 {
        self.components
            .first()
            .and_then(|c| c.values.get(bar).copied())
            .unwrap_or(0.0)
    }
}
