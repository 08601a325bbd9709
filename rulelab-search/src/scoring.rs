//! Scoring — converts a backtest report into a comparable scalar.
//!
//! Three families: net balance (optionally at an out-of-sample bar), a
//! built-in simple metric catalog, and pluggable external scorers that
//! receive the serialized configuration plus the position list.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use rulelab_core::backtest::PositionRecord;
use rulelab_core::AccountStats;

/// Built-in simple scoring metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimpleMetric {
    AnnualizedProfit,
    AnnualizedProfitPercent,
    AvgHoldingPeriodReturn,
    GeomHoldingPeriodReturn,
    ProfitFactor,
    SharpeRatio,
    WinLossRatio,
}

impl SimpleMetric {
    pub const ALL: [SimpleMetric; 7] = [
        Self::AnnualizedProfit,
        Self::AnnualizedProfitPercent,
        Self::AvgHoldingPeriodReturn,
        Self::GeomHoldingPeriodReturn,
        Self::ProfitFactor,
        Self::SharpeRatio,
        Self::WinLossRatio,
    ];

    /// Display label of the metric.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AnnualizedProfit => "Annualized Profit",
            Self::AnnualizedProfitPercent => "Annualized Profit %",
            Self::AvgHoldingPeriodReturn => "Average Holding Period Ret.",
            Self::GeomHoldingPeriodReturn => "Geometric Holding Period Ret.",
            Self::ProfitFactor => "Profit Factor",
            Self::SharpeRatio => "Sharpe Ratio",
            Self::WinLossRatio => "Win/Loss Ratio",
        }
    }

    /// Extract the metric value from account statistics.
    pub fn extract(&self, stats: &AccountStats) -> f64 {
        match self {
            Self::AnnualizedProfit => stats.annualized_profit,
            Self::AnnualizedProfitPercent => stats.annualized_profit_percent,
            Self::AvgHoldingPeriodReturn => stats.avg_holding_period_ret,
            Self::GeomHoldingPeriodReturn => stats.geom_holding_period_ret,
            Self::ProfitFactor => stats.profit_factor,
            Self::SharpeRatio => stats.sharpe_ratio,
            Self::WinLossRatio => stats.win_loss_ratio,
        }
    }
}

impl FromStr for SimpleMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "annualized-profit" => Ok(Self::AnnualizedProfit),
            "annualized-profit-pct" => Ok(Self::AnnualizedProfitPercent),
            "avg-hpr" => Ok(Self::AvgHoldingPeriodReturn),
            "geom-hpr" => Ok(Self::GeomHoldingPeriodReturn),
            "profit-factor" => Ok(Self::ProfitFactor),
            "sharpe" => Ok(Self::SharpeRatio),
            "win-loss" => Ok(Self::WinLossRatio),
            other => Err(format!("unknown metric '{other}'")),
        }
    }
}

/// Which scoring mode drives the search.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum ScoringSelection {
    /// Net balance, or balance at the out-of-sample bar when OOS is active.
    #[default]
    NetBalance,
    /// A built-in simple metric.
    Simple(SimpleMetric),
    /// A named option resolved by the external scorer.
    SimpleExternal(String),
    /// Fully delegated to the external scorer.
    Advanced,
}

impl ScoringSelection {
    /// Display label of the active criterion.
    pub fn label(&self) -> String {
        match self {
            Self::NetBalance => "Net Balance".into(),
            Self::Simple(metric) => metric.label().into(),
            Self::SimpleExternal(name) => name.clone(),
            Self::Advanced => "Advanced".into(),
        }
    }

    /// Whether this mode needs an external scorer attached.
    pub fn needs_scorer(&self) -> bool {
        matches!(self, Self::SimpleExternal(_) | Self::Advanced)
    }
}

/// A computed score plus its display label.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub value: f64,
    pub label: String,
}

/// External scorer failures. Non-fatal: the candidate is scored not-better.
#[derive(Debug, Clone, Error)]
pub enum ScoreError {
    #[error("scorer has no option '{0}'")]
    UnknownOption(String),
    #[error("scorer failed: {0}")]
    Failed(String),
    #[error("scoring mode requires an external scorer but none is attached")]
    MissingScorer,
}

/// Input handed to pluggable scorers.
pub struct ScoreInput<'a> {
    /// JSON serialization of the candidate configuration.
    pub config_json: String,
    pub positions: &'a [PositionRecord],
}

/// A pluggable external scorer.
pub trait CustomScorer: Send + Sync {
    /// Named options this scorer adds to the simple catalog.
    fn simple_options(&self) -> Vec<String> {
        Vec::new()
    }

    /// Named options for advanced mode.
    fn advanced_options(&self) -> Vec<String> {
        Vec::new()
    }

    fn score_simple(&self, option: &str, input: &ScoreInput<'_>) -> Result<Score, ScoreError>;

    fn score_advanced(&self, input: &ScoreInput<'_>) -> Result<Score, ScoreError>;
}

/// All simple scoring options: built-ins plus scorer extras, sorted.
pub fn simple_options(scorer: Option<&dyn CustomScorer>) -> Vec<String> {
    let mut options: Vec<String> = SimpleMetric::ALL
        .iter()
        .map(|m| m.label().to_string())
        .collect();
    if let Some(scorer) = scorer {
        options.extend(scorer.simple_options());
    }
    options.sort();
    options
}

/// Caller-defined eligibility predicate over the backtester's state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcceptanceCriteria {
    /// Minimum number of closed trades.
    pub min_trades: Option<usize>,
    /// Maximum percentage balance drawdown.
    pub max_drawdown_percent: Option<f64>,
}

impl AcceptanceCriteria {
    pub fn is_fulfilled(&self, stats: &AccountStats) -> bool {
        if let Some(min) = self.min_trades {
            if stats.executed_trades < min {
                return false;
            }
        }
        if let Some(max) = self.max_drawdown_percent {
            if stats.equity_percent_drawdown > max {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats_with(sharpe: f64, trades: usize, drawdown: f64) -> AccountStats {
        let mut stats = AccountStats::compute(vec![10_000.0, 10_100.0], &[], 10_000.0, 252.0);
        stats.sharpe_ratio = sharpe;
        stats.executed_trades = trades;
        stats.equity_percent_drawdown = drawdown;
        stats
    }

    #[test]
    fn extract_matches_label() {
        let stats = stats_with(1.5, 10, 5.0);
        assert_eq!(SimpleMetric::SharpeRatio.extract(&stats), 1.5);
        assert_eq!(SimpleMetric::SharpeRatio.label(), "Sharpe Ratio");
    }

    #[test]
    fn metric_parses_from_cli_names() {
        assert_eq!(
            "sharpe".parse::<SimpleMetric>().unwrap(),
            SimpleMetric::SharpeRatio
        );
        assert_eq!(
            "profit-factor".parse::<SimpleMetric>().unwrap(),
            SimpleMetric::ProfitFactor
        );
        assert!("alpha".parse::<SimpleMetric>().is_err());
    }

    #[test]
    fn selection_labels() {
        assert_eq!(ScoringSelection::NetBalance.label(), "Net Balance");
        assert_eq!(
            ScoringSelection::Simple(SimpleMetric::ProfitFactor).label(),
            "Profit Factor"
        );
        assert_eq!(
            ScoringSelection::SimpleExternal("Kelly".into()).label(),
            "Kelly"
        );
    }

    #[test]
    fn external_modes_need_a_scorer() {
        assert!(!ScoringSelection::NetBalance.needs_scorer());
        assert!(ScoringSelection::Advanced.needs_scorer());
        assert!(ScoringSelection::SimpleExternal("x".into()).needs_scorer());
    }

    #[test]
    fn simple_options_are_sorted_and_extended() {
        struct Extra;
        impl CustomScorer for Extra {
            fn simple_options(&self) -> Vec<String> {
                vec!["Zeta".into(), "Alpha".into()]
            }
            fn score_simple(&self, _: &str, _: &ScoreInput<'_>) -> Result<Score, ScoreError> {
                Err(ScoreError::Failed("unused".into()))
            }
            fn score_advanced(&self, _: &ScoreInput<'_>) -> Result<Score, ScoreError> {
                Err(ScoreError::Failed("unused".into()))
            }
        }
        let options = simple_options(Some(&Extra));
        assert_eq!(options.len(), 9);
        let mut sorted = options.clone();
        sorted.sort();
        assert_eq!(options, sorted);
        assert!(options.contains(&"Alpha".to_string()));
    }

    #[test]
    fn criteria_default_always_passes() {
        assert!(AcceptanceCriteria::default().is_fulfilled(&stats_with(0.0, 0, 99.0)));
    }

    #[test]
    fn criteria_min_trades() {
        let criteria = AcceptanceCriteria {
            min_trades: Some(10),
            max_drawdown_percent: None,
        };
        assert!(!criteria.is_fulfilled(&stats_with(1.0, 9, 0.0)));
        assert!(criteria.is_fulfilled(&stats_with(1.0, 10, 0.0)));
    }

    #[test]
    fn criteria_max_drawdown() {
        let criteria = AcceptanceCriteria {
            min_trades: None,
            max_drawdown_percent: Some(20.0),
        };
        assert!(!criteria.is_fulfilled(&stats_with(1.0, 5, 35.0)));
        assert!(criteria.is_fulfilled(&stats_with(1.0, 5, 15.0)));
    }
}
