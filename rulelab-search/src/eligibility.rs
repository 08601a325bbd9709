//! Eligible-indicator lists per slot kind.
//!
//! Built once per run from the provider: non-generatable indicators are
//! dropped everywhere, intraday-only indicators are dropped on day/week
//! data, and reverse-style exits are dropped when the template's
//! properties are locked to a non-Reverse opposite-direction action.

use rand::seq::SliceRandom;
use rand::Rng;

use rulelab_core::indicators::{Indicator, IndicatorProvider};
use rulelab_core::{Granularity, OppositeDirAction, SlotKind, SlotStatus, StrategyProperties};

use crate::blacklist::IndicatorBlacklist;
use crate::error::{CycleFault, SearchError};
use crate::sampler::CarryOver;

/// Exit indicator that closes only by reversing into the opposite signal.
/// Pointless when the opposite-direction action is locked to anything else.
const REVERSAL_EXIT: &str = "Close and Reverse";

#[derive(Debug, Clone, Default)]
pub struct EligibleIndicators {
    pub entry_signals: Vec<String>,
    pub entry_filters: Vec<String>,
    pub exit_signals: Vec<String>,
    pub exit_signals_with_filters: Vec<String>,
    pub exit_filters: Vec<String>,
}

impl EligibleIndicators {
    /// Build the per-kind lists for a run.
    pub fn build(
        provider: &dyn IndicatorProvider,
        granularity: Granularity,
        template_props: &StrategyProperties,
    ) -> Self {
        let mut lists = Self::default();
        for name in provider.names() {
            let Ok(indicator) = provider.construct(&name) else {
                continue;
            };
            if !indicator.is_generatable() {
                continue;
            }
            if indicator.intraday_only() && !granularity.is_intraday() {
                continue;
            }
            for &kind in indicator.supported_kinds() {
                match kind {
                    SlotKind::EntrySignal => lists.entry_signals.push(name.clone()),
                    SlotKind::EntryFilter => lists.entry_filters.push(name.clone()),
                    SlotKind::ExitSignal => {
                        lists.exit_signals.push(name.clone());
                        if indicator.supports_exit_filters() {
                            lists.exit_signals_with_filters.push(name.clone());
                        }
                    }
                    SlotKind::ExitFilter => lists.exit_filters.push(name.clone()),
                }
            }
        }

        if template_props.status == SlotStatus::Locked
            && template_props.opp_signal_action != OppositeDirAction::Reverse
        {
            lists.exit_signals.retain(|n| n != REVERSAL_EXIT);
            lists.exit_signals_with_filters.retain(|n| n != REVERSAL_EXIT);
        }
        lists
    }

    pub fn supports_exit_filters(&self, name: &str) -> bool {
        self.exit_signals_with_filters.iter().any(|n| n == name)
    }

    /// Pre-run availability check: every unlocked kind must retain enough
    /// indicators to fill its slots.
    pub fn check_available(
        &self,
        carry: &CarryOver,
        max_entry_filters: usize,
        max_exit_filters: usize,
        entry_locked: bool,
        exit_locked: bool,
    ) -> Result<(), SearchError> {
        if !entry_locked && self.entry_signals.is_empty() {
            return Err(SearchError::NotEnoughIndicators {
                kind: SlotKind::EntrySignal,
            });
        }
        if self.entry_filters.len() < max_entry_filters.saturating_sub(carry.entry_filters.len()) {
            return Err(SearchError::NotEnoughIndicators {
                kind: SlotKind::EntryFilter,
            });
        }
        if !exit_locked && self.exit_signals.is_empty() {
            return Err(SearchError::NotEnoughIndicators {
                kind: SlotKind::ExitSignal,
            });
        }
        if !exit_locked && max_exit_filters > 0 && self.exit_signals_with_filters.is_empty() {
            return Err(SearchError::NotEnoughIndicators {
                kind: SlotKind::ExitSignal,
            });
        }
        if !carry.exit_filters.is_empty() && self.exit_signals_with_filters.is_empty() {
            return Err(SearchError::NotEnoughIndicators {
                kind: SlotKind::ExitSignal,
            });
        }
        if self.exit_filters.len() < max_exit_filters.saturating_sub(carry.exit_filters.len()) {
            return Err(SearchError::NotEnoughIndicators {
                kind: SlotKind::ExitFilter,
            });
        }
        Ok(())
    }

    /// Draw a uniformly random indicator name for a slot kind, excluding
    /// blacklisted names. An empty remainder is space exhaustion.
    pub fn draw<R: Rng>(
        &self,
        kind: SlotKind,
        exit_with_filters: bool,
        blacklist: &IndicatorBlacklist,
        rng: &mut R,
    ) -> Result<String, CycleFault> {
        let pool = match kind {
            SlotKind::EntrySignal => &self.entry_signals,
            SlotKind::EntryFilter => &self.entry_filters,
            SlotKind::ExitSignal => {
                if exit_with_filters {
                    &self.exit_signals_with_filters
                } else {
                    &self.exit_signals
                }
            }
            SlotKind::ExitFilter => &self.exit_filters,
        };
        let candidates: Vec<&String> =
            pool.iter().filter(|n| !blacklist.contains(n)).collect();
        candidates
            .choose(rng)
            .map(|n| n.to_string())
            .ok_or(CycleFault::SpaceExhaustion { kind })
    }
}
