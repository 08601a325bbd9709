//! Strategy model: slots, configurations, scalar properties.

pub mod config;
pub mod slot;

pub use config::{
    Configuration, OppositeDirAction, ProtectionType, SameDirAction, StrategyProperties,
};
pub use slot::{ChartMeta, IndicatorComponent, SlotKind, SlotSpec, SlotStatus};
