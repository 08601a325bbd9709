//! Account statistics — pure functions over the balance curve and the
//! closed-trade list.

use serde::{Deserialize, Serialize};

/// Aggregate account statistics for one backtest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountStats {
    pub initial_account: f64,
    /// Realized profit over the whole run (the "net balance" gate).
    pub net_balance: f64,
    /// Initial account plus realized profit.
    pub net_money_balance: f64,
    /// Realized money balance per bar.
    pub balance_curve: Vec<f64>,
    pub executed_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub annualized_profit: f64,
    pub annualized_profit_percent: f64,
    pub avg_holding_period_ret: f64,
    pub geom_holding_period_ret: f64,
    pub profit_factor: f64,
    pub sharpe_ratio: f64,
    pub win_loss_ratio: f64,
    pub max_drawdown: f64,
    pub equity_percent_drawdown: f64,
}

impl AccountStats {
    /// Compute all statistics.
    ///
    /// `trade_results` holds `(pnl, balance_before)` per closed trade, in
    /// close order.
    pub fn compute(
        balance_curve: Vec<f64>,
        trade_results: &[(f64, f64)],
        initial_account: f64,
        bars_per_year: f64,
    ) -> Self {
        let final_balance = balance_curve.last().copied().unwrap_or(initial_account);
        let net_balance = final_balance - initial_account;
        let bars = balance_curve.len().max(1);

        let winning = trade_results.iter().filter(|(pnl, _)| *pnl > 0.0).count();
        let losing = trade_results.iter().filter(|(pnl, _)| *pnl < 0.0).count();
        let gross_profit: f64 = trade_results
            .iter()
            .map(|(pnl, _)| pnl.max(0.0))
            .sum();
        let gross_loss: f64 = trade_results
            .iter()
            .map(|(pnl, _)| (-pnl).max(0.0))
            .sum();

        let returns: Vec<f64> = trade_results
            .iter()
            .filter(|(_, before)| *before > 0.0)
            .map(|(pnl, before)| pnl / before)
            .collect();
        let avg_ret = mean(&returns);
        let geom_ret = if returns.is_empty() || returns.iter().any(|r| *r <= -1.0) {
            0.0
        } else {
            let product: f64 = returns.iter().map(|r| 1.0 + r).product();
            product.powf(1.0 / returns.len() as f64) - 1.0
        };

        let annualized_profit = net_balance * bars_per_year / bars as f64;
        let annualized_profit_percent = if initial_account > 0.0 {
            100.0 * annualized_profit / initial_account
        } else {
            0.0
        };

        Self {
            initial_account,
            net_balance,
            net_money_balance: final_balance,
            executed_trades: trade_results.len(),
            winning_trades: winning,
            losing_trades: losing,
            gross_profit,
            gross_loss,
            annualized_profit,
            annualized_profit_percent,
            avg_holding_period_ret: avg_ret,
            geom_holding_period_ret: geom_ret,
            profit_factor: profit_factor(gross_profit, gross_loss),
            sharpe_ratio: sharpe_ratio(&balance_curve, bars_per_year),
            win_loss_ratio: win_loss_ratio(winning, losing),
            max_drawdown: max_drawdown(&balance_curve),
            equity_percent_drawdown: percent_drawdown(&balance_curve),
            balance_curve,
        }
    }

    /// Realized balance at a bar; the last known value past the end.
    pub fn balance_at(&self, bar: usize) -> f64 {
        if self.balance_curve.is_empty() {
            return self.initial_account;
        }
        let idx = bar.min(self.balance_curve.len() - 1);
        self.balance_curve[idx]
    }
}

// ─── Individual metric functions ─────────────────────────────────────

/// Gross profit over gross loss. No losses and some profit is reported as
/// infinity, mirroring the usual convention.
pub fn profit_factor(gross_profit: f64, gross_loss: f64) -> f64 {
    if gross_loss <= 0.0 {
        if gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        gross_profit / gross_loss
    }
}

/// Winners over all closed trades; 0.0 with no trades.
pub fn win_loss_ratio(winning: usize, losing: usize) -> f64 {
    let total = winning + losing;
    if total == 0 {
        0.0
    } else {
        winning as f64 / total as f64
    }
}

/// Annualized Sharpe ratio over per-bar balance returns.
/// Returns 0.0 if variance is zero or fewer than 3 bars.
pub fn sharpe_ratio(balance_curve: &[f64], bars_per_year: f64) -> f64 {
    if balance_curve.len() < 3 {
        return 0.0;
    }
    let returns: Vec<f64> = balance_curve
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect();
    if returns.len() < 2 {
        return 0.0;
    }
    let m = mean(&returns);
    let sd = std_dev(&returns);
    if sd < 1e-15 {
        return 0.0;
    }
    (m / sd) * bars_per_year.sqrt()
}

/// Largest absolute peak-to-trough decline of the balance curve.
pub fn max_drawdown(balance_curve: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0f64;
    for &value in balance_curve {
        peak = peak.max(value);
        worst = worst.max(peak - value);
    }
    worst
}

/// Largest percentage peak-to-trough decline of the balance curve.
pub fn percent_drawdown(balance_curve: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0f64;
    for &value in balance_curve {
        peak = peak.max(value);
        if peak > 0.0 {
            worst = worst.max(100.0 * (peak - value) / peak);
        }
    }
    worst
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_basic_profit() {
        let curve = vec![10_000.0, 10_000.0, 10_100.0, 10_050.0, 10_200.0];
        let trades = [(100.0, 10_000.0), (-50.0, 10_100.0), (150.0, 10_050.0)];
        let stats = AccountStats::compute(curve, &trades, 10_000.0, 252.0);

        assert!((stats.net_balance - 200.0).abs() < 1e-9);
        assert!((stats.net_money_balance - 10_200.0).abs() < 1e-9);
        assert_eq!(stats.executed_trades, 3);
        assert_eq!(stats.winning_trades, 2);
        assert_eq!(stats.losing_trades, 1);
        assert!((stats.gross_profit - 250.0).abs() < 1e-9);
        assert!((stats.gross_loss - 50.0).abs() < 1e-9);
        assert!((stats.profit_factor - 5.0).abs() < 1e-9);
    }

    #[test]
    fn balance_at_clamps_to_curve_end() {
        let curve = vec![10_000.0, 10_100.0];
        let stats = AccountStats::compute(curve, &[], 10_000.0, 252.0);
        assert_eq!(stats.balance_at(0), 10_000.0);
        assert_eq!(stats.balance_at(1), 10_100.0);
        assert_eq!(stats.balance_at(999), 10_100.0);
    }

    #[test]
    fn balance_at_empty_curve_is_initial() {
        let stats = AccountStats::compute(vec![], &[], 10_000.0, 252.0);
        assert_eq!(stats.balance_at(5), 10_000.0);
    }

    #[test]
    fn profit_factor_no_losses_is_infinite() {
        assert!(profit_factor(100.0, 0.0).is_infinite());
        assert_eq!(profit_factor(0.0, 0.0), 0.0);
    }

    #[test]
    fn win_loss_ratio_handles_zero_trades() {
        assert_eq!(win_loss_ratio(0, 0), 0.0);
        assert!((win_loss_ratio(3, 1) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn max_drawdown_measures_worst_decline() {
        let curve = vec![100.0, 120.0, 90.0, 110.0, 80.0];
        assert!((max_drawdown(&curve) - 40.0).abs() < 1e-12);
    }

    #[test]
    fn percent_drawdown_measures_relative_decline() {
        let curve = vec![100.0, 200.0, 100.0];
        assert!((percent_drawdown(&curve) - 50.0).abs() < 1e-12);
    }

    #[test]
    fn sharpe_zero_for_flat_curve() {
        let curve = vec![10_000.0; 10];
        assert_eq!(sharpe_ratio(&curve, 252.0), 0.0);
    }

    #[test]
    fn sharpe_positive_for_steady_gains() {
        let curve: Vec<f64> = (0..20).map(|i| 10_000.0 + 10.0 * i as f64 * i as f64).collect();
        assert!(sharpe_ratio(&curve, 252.0) > 0.0);
    }

    #[test]
    fn geometric_return_zero_on_wipeout() {
        let trades = [(-12_000.0, 10_000.0)];
        let stats = AccountStats::compute(vec![10_000.0, -2_000.0], &trades, 10_000.0, 252.0);
        assert_eq!(stats.geom_holding_period_ret, 0.0);
    }
}
