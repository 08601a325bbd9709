//! Search error taxonomy.
//!
//! Fatal errors (`SearchError`) refuse or abort a run. Per-candidate
//! faults (`CycleFault`) are recoverable: calculation faults blacklist the
//! indicator and restart candidate construction, warmup exhaustion simply
//! restarts, and space exhaustion is escalated to a terminal outcome.

use thiserror::Error;

use rulelab_core::indicators::CalculationFault;
use rulelab_core::SlotKind;

/// Errors that refuse to start a run or abort one.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("no search space: entry and exit are locked with no randomizable parameters")]
    NoSearchSpace,
    #[error("not enough eligible indicators for {kind:?} slots")]
    NotEnoughIndicators { kind: SlotKind },
    #[error("failed to restore the best configuration: {0}")]
    Restore(String),
}

/// Recoverable faults raised while building one candidate.
#[derive(Debug, Error)]
pub enum CycleFault {
    #[error(transparent)]
    Calculation(#[from] CalculationFault),
    #[error("indicator '{indicator}' warms up within the last bars of history on every draw")]
    WarmupExhausted { indicator: String },
    #[error("no eligible indicator remains for {kind:?} after blacklist exclusion")]
    SpaceExhaustion { kind: SlotKind },
}
