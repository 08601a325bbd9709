//! RuleLab Search — randomized generation of trading-rule configurations.
//!
//! This crate builds on `rulelab-core` to provide:
//! - Per-kind eligible-indicator lists with blacklist-aware drawing
//! - The configuration-space sampler (structural locks respected)
//! - The parameter randomizer with validity retries and warmup rejection
//! - Scoring (net balance, built-in metrics, pluggable external scorers)
//! - The best-result tracker with a bounded nomination list
//! - The bounded, cancellable generation loop with progress events

pub mod blacklist;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod evaluator;
pub mod generator;
pub mod leaderboard;
pub mod progress;
pub mod randomizer;
pub mod sampler;
pub mod scoring;

pub use blacklist::IndicatorBlacklist;
pub use config::{ConfigError, MoneySettings, SearchConfig};
pub use eligibility::EligibleIndicators;
pub use error::{CycleFault, SearchError};
pub use evaluator::{Assessment, FitnessEvaluator};
pub use generator::{
    spawn_generation, GenerationEvent, GenerationHandle, GenerationReport, GenerationSession,
    RunOutcome,
};
pub use leaderboard::{BestTracker, FitnessRecord, Promotion, SCORE_EPSILON};
pub use progress::ProgressGauge;
pub use sampler::{detect_locks, CarryOver, ConfigSampler, Locks};
pub use scoring::{
    simple_options, AcceptanceCriteria, CustomScorer, Score, ScoreError, ScoreInput,
    ScoringSelection, SimpleMetric,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<SearchConfig>();
        assert_sync::<SearchConfig>();
        assert_send::<MoneySettings>();
        assert_sync::<MoneySettings>();
    }

    #[test]
    fn tracker_types_are_send_sync() {
        assert_send::<BestTracker>();
        assert_sync::<BestTracker>();
        assert_send::<FitnessRecord>();
        assert_sync::<FitnessRecord>();
    }

    #[test]
    fn event_types_are_send_sync() {
        assert_send::<GenerationEvent>();
        assert_sync::<GenerationEvent>();
        assert_send::<GenerationReport>();
        assert_sync::<GenerationReport>();
        assert_send::<RunOutcome>();
        assert_sync::<RunOutcome>();
    }

    #[test]
    fn session_is_send() {
        assert_send::<GenerationSession>();
    }

    #[test]
    fn blacklist_is_send_sync() {
        assert_send::<IndicatorBlacklist>();
        assert_sync::<IndicatorBlacklist>();
    }
}
