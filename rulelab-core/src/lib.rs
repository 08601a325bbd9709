//! RuleLab Core — domain types, indicator catalog, reference backtester.
//!
//! This crate contains everything the search engine builds on:
//! - Domain types (bars, datasets, slots, configurations, parameter domains)
//! - The `Indicator`/`IndicatorProvider` capability and a built-in catalog
//! - The `Backtester` capability, account statistics and a reference
//!   bar-walk simulator
//! - A deterministic BLAKE3-based RNG hierarchy
//! - CSV dataset ingestion

pub mod backtest;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod params;
pub mod rng;
pub mod strategy;

pub use backtest::{AccountStats, BacktestFault, BacktestReport, Backtester, SimBacktester};
pub use domain::{Bar, ConfigHash, Dataset, Granularity, RunId};
pub use indicators::{BuiltinCatalog, CalculationFault, Indicator, IndicatorProvider};
pub use params::{ListParam, NumericParam, ParamSet};
pub use rng::RngHierarchy;
pub use strategy::{
    Configuration, OppositeDirAction, ProtectionType, SameDirAction, SlotKind, SlotSpec,
    SlotStatus, StrategyProperties,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types crossing the search worker thread are
    /// Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Bar>();
        require_sync::<Bar>();
        require_send::<Dataset>();
        require_sync::<Dataset>();
        require_send::<Configuration>();
        require_sync::<Configuration>();
        require_send::<SlotSpec>();
        require_sync::<SlotSpec>();
        require_send::<ParamSet>();
        require_sync::<ParamSet>();
        require_send::<AccountStats>();
        require_sync::<AccountStats>();
        require_send::<BacktestReport>();
        require_sync::<BacktestReport>();
        require_send::<RngHierarchy>();
        require_sync::<RngHierarchy>();
        require_send::<SimBacktester>();
        require_sync::<SimBacktester>();
        require_send::<BuiltinCatalog>();
        require_sync::<BuiltinCatalog>();
    }
}
