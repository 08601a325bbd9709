//! Strategy configuration — ordered slots plus scalar properties.

use serde::{Deserialize, Serialize};

use crate::domain::ConfigHash;
use crate::strategy::slot::{SlotKind, SlotSpec, SlotStatus};

/// Reaction to a new signal in the same direction as the open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SameDirAction {
    #[default]
    Nothing,
    Winner,
    Add,
}

impl SameDirAction {
    pub const ALL: [SameDirAction; 3] = [Self::Nothing, Self::Winner, Self::Add];
}

/// Reaction to a new signal opposite to the open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OppositeDirAction {
    #[default]
    Nothing,
    Reduce,
    Close,
    Reverse,
}

impl OppositeDirAction {
    pub const ALL: [OppositeDirAction; 4] =
        [Self::Nothing, Self::Reduce, Self::Close, Self::Reverse];
}

/// How a permanent stop-loss / take-profit distance is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProtectionType {
    #[default]
    Relative,
    Absolute,
}

/// Scalar strategy properties: lot sizing, protection, signal actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyProperties {
    pub status: SlotStatus,
    pub use_account_percent_entry: bool,
    pub max_open_lots: f64,
    pub entry_lots: f64,
    pub adding_lots: f64,
    pub reducing_lots: f64,
    pub same_signal_action: SameDirAction,
    pub opp_signal_action: OppositeDirAction,
    pub use_permanent_sl: bool,
    pub permanent_sl_type: ProtectionType,
    pub permanent_sl: f64,
    pub use_permanent_tp: bool,
    pub permanent_tp_type: ProtectionType,
    pub permanent_tp: f64,
    pub use_break_even: bool,
    pub break_even: f64,
    pub use_martingale: bool,
    pub martingale_multiplier: f64,
}

impl Default for StrategyProperties {
    fn default() -> Self {
        Self {
            status: SlotStatus::Open,
            use_account_percent_entry: false,
            max_open_lots: 20.0,
            entry_lots: 1.0,
            adding_lots: 1.0,
            reducing_lots: 1.0,
            same_signal_action: SameDirAction::Nothing,
            opp_signal_action: OppositeDirAction::Nothing,
            use_permanent_sl: false,
            permanent_sl_type: ProtectionType::Relative,
            permanent_sl: 1000.0,
            use_permanent_tp: false,
            permanent_tp_type: ProtectionType::Relative,
            permanent_tp: 1000.0,
            use_break_even: false,
            break_even: 1000.0,
            use_martingale: false,
            martingale_multiplier: 2.0,
        }
    }
}

/// A complete trading-rule configuration: one entry signal, 0..N entry
/// filters, one exit signal, 0..M exit filters, plus scalar properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub name: String,
    pub slots: Vec<SlotSpec>,
    pub props: StrategyProperties,
}

impl Configuration {
    /// Skeleton configuration with the given filter counts, slots in
    /// canonical order: entry signal, entry filters, exit signal, exit
    /// filters.
    pub fn new(entry_filters: usize, exit_filters: usize) -> Self {
        let mut slots = Vec::with_capacity(2 + entry_filters + exit_filters);
        let mut index = 0;
        slots.push(SlotSpec::new(index, SlotKind::EntrySignal));
        for _ in 0..entry_filters {
            index += 1;
            slots.push(SlotSpec::new(index, SlotKind::EntryFilter));
        }
        index += 1;
        slots.push(SlotSpec::new(index, SlotKind::ExitSignal));
        for _ in 0..exit_filters {
            index += 1;
            slots.push(SlotSpec::new(index, SlotKind::ExitFilter));
        }
        Self {
            name: "Generated".into(),
            slots,
            props: StrategyProperties::default(),
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Index of the entry-signal slot (always 0 in canonical order).
    pub fn entry_slot(&self) -> usize {
        0
    }

    /// Index of the exit-signal slot.
    pub fn exit_slot(&self) -> usize {
        1 + self.entry_filter_count()
    }

    pub fn entry_filter_count(&self) -> usize {
        self.count_kind(SlotKind::EntryFilter)
    }

    pub fn exit_filter_count(&self) -> usize {
        self.count_kind(SlotKind::ExitFilter)
    }

    fn count_kind(&self, kind: SlotKind) -> usize {
        self.slots.iter().filter(|s| s.kind == kind).count()
    }

    pub fn slots_of(&self, kind: SlotKind) -> impl Iterator<Item = &SlotSpec> {
        self.slots.iter().filter(move |s| s.kind == kind)
    }

    /// Indicator name of the exit-signal slot.
    pub fn exit_indicator(&self) -> &str {
        &self.slots[self.exit_slot()].indicator
    }

    /// Earliest bar from which every slot's components are valid.
    pub fn first_bar(&self) -> usize {
        self.slots.iter().map(|s| s.first_valid_bar()).max().unwrap_or(0)
    }

    /// Assign the default logical group to every open slot: signals join
    /// the "All" group, entry filters "A", exit filters "a".
    pub fn assign_default_groups(&mut self) {
        for slot in &mut self.slots {
            if slot.status != SlotStatus::Open {
                continue;
            }
            slot.group = match slot.kind {
                SlotKind::EntrySignal | SlotKind::ExitSignal => "All".into(),
                SlotKind::EntryFilter => "A".into(),
                SlotKind::ExitFilter => "a".into(),
            };
        }
    }

    /// Structural invariant: exactly one entry signal first, then entry
    /// filters, then exactly one exit signal, then exit filters.
    pub fn structure_is_valid(&self) -> bool {
        let kinds: Vec<SlotKind> = self.slots.iter().map(|s| s.kind).collect();
        let mut expected = vec![SlotKind::EntrySignal];
        expected.extend(std::iter::repeat(SlotKind::EntryFilter).take(self.entry_filter_count()));
        expected.push(SlotKind::ExitSignal);
        expected.extend(std::iter::repeat(SlotKind::ExitFilter).take(self.exit_filter_count()));
        kinds == expected
            && self.count_kind(SlotKind::EntrySignal) == 1
            && self.count_kind(SlotKind::ExitSignal) == 1
            && self.slots.iter().enumerate().all(|(i, s)| s.index == i)
    }

    /// Content hash over indicator names, parameter values and properties.
    ///
    /// Component series are `#[serde(skip)]`, so recomputation does not
    /// change the hash.
    pub fn fingerprint(&self) -> ConfigHash {
        let json = serde_json::to_string(self).unwrap_or_default();
        ConfigHash(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
