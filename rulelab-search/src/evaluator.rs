//! Fitness evaluator — converts a candidate into a comparable scalar and
//! offers it to the tracker.
//!
//! Backtest faults are non-fatal: the candidate scores not-better and the
//! fault is surfaced as a notice. A candidate is scoring-eligible only
//! when the acceptance criteria pass and the net balance is strictly
//! positive.

use tracing::debug;

use rulelab_core::{BacktestReport, Backtester, Configuration, Dataset};

use crate::config::MoneySettings;
use crate::leaderboard::{BestTracker, Promotion};
use crate::scoring::{
    AcceptanceCriteria, CustomScorer, Score, ScoreError, ScoreInput, ScoringSelection,
};

/// Lot-size ladder swept over profitable candidates: 0.5 up to 10.0.
const LOT_LADDER_STEP: f64 = 0.5;
const LOT_LADDER_RUNGS: usize = 20;

pub struct FitnessEvaluator<'a> {
    pub backtester: &'a dyn Backtester,
    pub scorer: Option<&'a dyn CustomScorer>,
    pub scoring: &'a ScoringSelection,
    pub criteria: &'a AcceptanceCriteria,
    pub money: &'a MoneySettings,
    pub oos_bar: Option<usize>,
    pub accept_equal: bool,
}

/// Outcome of assessing one candidate (or one ladder rung).
#[derive(Debug, Clone)]
pub struct Assessment {
    /// The candidate improved or tie-replaced the best.
    pub better: bool,
    /// Non-fatal fault or scoring problem to surface.
    pub notice: Option<String>,
    /// Net balance of the run, when the backtest succeeded.
    pub net_balance: Option<f64>,
}

impl FitnessEvaluator<'_> {
    /// Backtest, gate, score and offer one candidate to the tracker.
    pub fn assess(
        &self,
        config: &mut Configuration,
        dataset: &Dataset,
        tracker: &mut BestTracker,
        calculations: &mut u64,
    ) -> Assessment {
        config.assign_default_groups();
        *calculations += 1;

        let report = match self.backtester.run(config, dataset) {
            Ok(report) => report,
            Err(fault) => {
                return Assessment {
                    better: false,
                    notice: Some(fault.to_string()),
                    net_balance: None,
                }
            }
        };

        let stats = &report.stats;
        let eligible = self.criteria.is_fulfilled(stats) && stats.net_balance > 0.0;
        let mut better = false;
        let mut notice = None;

        if eligible {
            match self.score(config, &report) {
                Ok(score) => {
                    let promotion = tracker.consider(score, config, self.accept_equal);
                    better = matches!(promotion, Promotion::Improved | Promotion::TieAccepted);
                    debug!(?promotion, net_balance = stats.net_balance, "candidate assessed");
                }
                Err(error) => notice = Some(format!("scoring failed: {error}")),
            }
        }

        Assessment {
            better,
            notice,
            net_balance: Some(stats.net_balance),
        }
    }

    /// Assess a candidate, then sweep the lot-size ladder if it was
    /// profitable and automatic lot sizing is on. Each rung may promote.
    /// The candidate counts as better only if some rung stays profitable;
    /// when none does, the configuration reverts to its pre-sweep state.
    pub fn assess_with_lot_ladder(
        &self,
        config: &mut Configuration,
        dataset: &Dataset,
        tracker: &mut BestTracker,
        calculations: &mut u64,
    ) -> Assessment {
        let first = self.assess(config, dataset, tracker, calculations);
        let profitable = first.net_balance.is_some_and(|b| b > 0.0);
        if !profitable || !self.money.auto_lot_sizing {
            return first;
        }

        let before = config.clone();
        let mut any_good = false;
        for rung in 1..=LOT_LADDER_RUNGS {
            config.props.entry_lots = rung as f64 * LOT_LADDER_STEP;
            let result = self.assess(config, dataset, tracker, calculations);
            any_good |= result.net_balance.is_some_and(|b| b > 0.0);
        }
        if !any_good {
            *config = before;
        }

        Assessment {
            better: first.better && any_good,
            notice: first.notice,
            net_balance: first.net_balance,
        }
    }

    fn score(&self, config: &Configuration, report: &BacktestReport) -> Result<Score, ScoreError> {
        let stats = &report.stats;
        match self.scoring {
            ScoringSelection::NetBalance => {
                let value = match self.oos_bar {
                    Some(bar) => stats.balance_at(bar) - stats.initial_account,
                    None => stats.net_balance,
                };
                Ok(Score {
                    value,
                    label: "Net Balance".into(),
                })
            }
            ScoringSelection::Simple(metric) => Ok(Score {
                value: metric.extract(stats),
                label: metric.label().into(),
            }),
            ScoringSelection::SimpleExternal(option) => {
                let scorer = self.scorer.ok_or(ScoreError::MissingScorer)?;
                scorer.score_simple(option, &score_input(config, report)?)
            }
            ScoringSelection::Advanced => {
                let scorer = self.scorer.ok_or(ScoreError::MissingScorer)?;
                scorer.score_advanced(&score_input(config, report)?)
            }
        }
    }
}

fn score_input<'a>(
    config: &Configuration,
    report: &'a BacktestReport,
) -> Result<ScoreInput<'a>, ScoreError> {
    let config_json =
        serde_json::to_string(config).map_err(|e| ScoreError::Failed(e.to_string()))?;
    Ok(ScoreInput {
        config_json,
        positions: &report.positions,
    })
}
