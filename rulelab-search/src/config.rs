//! Search configuration — validated, TOML-loadable.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::{AcceptanceCriteria, ScoringSelection};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Global money-management settings the generator reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MoneySettings {
    pub initial_account: f64,
    /// Enables the lot-size ladder sweep on profitable candidates.
    pub auto_lot_sizing: bool,
    /// When positive, overrides the template's lot sizes for every
    /// candidate.
    pub default_lot: f64,
    /// Forces the same-direction signal action to Nothing.
    pub single_order: bool,
    /// Five-digit quotes scale the randomized protection distances.
    pub five_digit_quotes: bool,
}

impl Default for MoneySettings {
    fn default() -> Self {
        Self {
            initial_account: 10_000.0,
            auto_lot_sizing: false,
            default_lot: 0.0,
            single_order: false,
            five_digit_quotes: false,
        }
    }
}

/// Complete search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Wall-clock budget; `None` runs until cancelled.
    pub budget_minutes: Option<u32>,
    /// Keep the leaderboard from the previous run instead of resetting.
    pub preserve_leaderboard: bool,
    pub max_entry_filters: usize,
    pub max_exit_filters: usize,
    /// Capacity of the near-best nomination list.
    pub nominations: usize,
    /// Promote candidates that tie the best score.
    pub accept_equal_score: bool,
    /// Keep indicator default values instead of randomizing numerics.
    pub use_default_param_values: bool,
    pub preserve_same_dir_action: bool,
    pub preserve_opp_dir_action: bool,
    pub preserve_permanent_sl: bool,
    pub preserve_permanent_tp: bool,
    pub preserve_break_even: bool,
    /// Out-of-sample mode: score net-balance at this bar instead of the end.
    pub oos_bar: Option<usize>,
    pub seed: u64,
    pub scoring: ScoringSelection,
    pub money: MoneySettings,
    pub criteria: AcceptanceCriteria,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            budget_minutes: Some(5),
            preserve_leaderboard: false,
            max_entry_filters: 2,
            max_exit_filters: 1,
            nominations: 10,
            accept_equal_score: false,
            use_default_param_values: false,
            preserve_same_dir_action: false,
            preserve_opp_dir_action: false,
            preserve_permanent_sl: false,
            preserve_permanent_tp: false,
            preserve_break_even: false,
            oos_bar: None,
            seed: 42,
            scoring: ScoringSelection::NetBalance,
            money: MoneySettings::default(),
            criteria: AcceptanceCriteria::default(),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.budget_minutes == Some(0) {
            return Err(ConfigError::Invalid("budget_minutes must be positive".into()));
        }
        if self.max_entry_filters > 12 || self.max_exit_filters > 12 {
            return Err(ConfigError::Invalid(
                "filter maxima above 12 are not supported".into(),
            ));
        }
        if self.money.initial_account <= 0.0 {
            return Err(ConfigError::Invalid(
                "initial_account must be positive".into(),
            ));
        }
        if self.money.default_lot < 0.0 {
            return Err(ConfigError::Invalid("default_lot must not be negative".into()));
        }
        Ok(())
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::SimpleMetric;

    #[test]
    fn default_config_is_valid() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_budget_is_rejected() {
        let config = SearchConfig {
            budget_minutes: Some(0),
            ..SearchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_default_lot_is_rejected() {
        let mut config = SearchConfig::default();
        config.money.default_lot = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn excessive_filter_maxima_are_rejected() {
        let config = SearchConfig {
            max_entry_filters: 13,
            ..SearchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_round_trip() {
        let config = SearchConfig {
            budget_minutes: Some(30),
            scoring: ScoringSelection::Simple(SimpleMetric::SharpeRatio),
            ..SearchConfig::default()
        };
        let text = toml::to_string(&config).unwrap();
        let back: SearchConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.budget_minutes, Some(30));
        assert_eq!(
            back.scoring,
            ScoringSelection::Simple(SimpleMetric::SharpeRatio)
        );
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let back: SearchConfig = toml::from_str("seed = 7\nmax_entry_filters = 3\n").unwrap();
        assert_eq!(back.seed, 7);
        assert_eq!(back.max_entry_filters, 3);
        assert_eq!(back.nominations, 10);
    }
}
