//! Backtester capability: the contract the generator requires from a
//! simulator, plus the reference implementation.

pub mod sim;
pub mod stats;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Dataset;
use crate::strategy::Configuration;

pub use sim::SimBacktester;
pub use stats::AccountStats;

/// The backtester faulted on a full configuration.
///
/// Recoverable at the search level: the candidate is scored as not-better
/// and the fault is surfaced as a notice.
#[derive(Debug, Clone, Error)]
#[error("backtest failed: {message}")]
pub struct BacktestFault {
    pub message: String,
}

impl BacktestFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Kind of transaction a position record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transaction {
    Open,
    Add,
    Reduce,
    Close,
    Reverse,
}

/// One position event, exposed to pluggable scorers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionRecord {
    pub number: usize,
    pub bar: usize,
    pub direction: i8,
    pub lots: f64,
    pub transaction: Transaction,
    pub order_price: f64,
    pub profit_loss: f64,
    pub balance: f64,
}

/// Everything a backtest run produces.
#[derive(Debug, Clone)]
pub struct BacktestReport {
    pub stats: AccountStats,
    pub positions: Vec<PositionRecord>,
}

/// Runs a full configuration over a dataset.
pub trait Backtester: Send + Sync {
    fn run(&self, config: &Configuration, dataset: &Dataset)
        -> Result<BacktestReport, BacktestFault>;
}
