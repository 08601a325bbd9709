//! Reference backtester — a compact bar-walk simulator.
//!
//! Walks the dataset from the configuration's first valid bar. Entries and
//! exits trigger at bar close; permanent stop-loss, take-profit and
//! break-even are checked intrabar against high/low (stop before take when
//! both are touched). The exit rule is the exit signal AND all exit
//! filters; entry requires the entry signal AND all entry filters.

use crate::backtest::{
    AccountStats, BacktestFault, BacktestReport, Backtester, PositionRecord, Transaction,
};
use crate::domain::Dataset;
use crate::strategy::{
    Configuration, OppositeDirAction, ProtectionType, SameDirAction, SlotKind, SlotSpec,
};

/// Price distance of one protection point (two-decimal quotes).
const POINT: f64 = 0.01;

/// Contract units per lot.
const LOT_UNITS: f64 = 100.0;

/// Reference `Backtester` implementation.
#[derive(Debug, Clone)]
pub struct SimBacktester {
    pub initial_account: f64,
}

impl Default for SimBacktester {
    fn default() -> Self {
        Self {
            initial_account: 10_000.0,
        }
    }
}

struct OpenPosition {
    dir: f64,
    lots: f64,
    /// Volume-weighted average entry price.
    price: f64,
    /// First entry price, the anchor for absolute protection.
    anchor: f64,
    balance_at_open: f64,
    realized: f64,
    be_done: bool,
}

struct SimState {
    balance: f64,
    base_lots: f64,
    next_lots: f64,
    number: usize,
    positions: Vec<PositionRecord>,
    trades: Vec<(f64, f64)>,
}

impl SimState {
    fn record(&mut self, bar: usize, dir: f64, lots: f64, transaction: Transaction, price: f64, pnl: f64) {
        self.positions.push(PositionRecord {
            number: self.number,
            bar,
            direction: if dir >= 0.0 { 1 } else { -1 },
            lots,
            transaction,
            order_price: price,
            profit_loss: pnl,
            balance: self.balance,
        });
        self.number += 1;
    }

    fn open(
        &mut self,
        bar: usize,
        dir: f64,
        price: f64,
        config: &Configuration,
        initial_account: f64,
    ) -> OpenPosition {
        let props = &config.props;
        let mut lots = self.next_lots;
        if props.use_account_percent_entry && initial_account > 0.0 {
            lots = (self.next_lots * self.balance / initial_account).max(0.0);
        }
        let lots = lots.min(props.max_open_lots);
        let position = OpenPosition {
            dir,
            lots,
            price,
            anchor: price,
            balance_at_open: self.balance,
            realized: 0.0,
            be_done: false,
        };
        self.record(bar, dir, lots, Transaction::Open, price, 0.0);
        position
    }

    fn close(
        &mut self,
        bar: usize,
        position: OpenPosition,
        price: f64,
        config: &Configuration,
        transaction: Transaction,
    ) {
        let props = &config.props;
        let pnl = position.dir * (price - position.price) * position.lots * LOT_UNITS;
        self.balance += pnl;
        let total = position.realized + pnl;
        self.trades.push((total, position.balance_at_open));
        self.record(bar, position.dir, position.lots, transaction, price, pnl);

        // Martingale: scale the next entry after a losing trade, reset
        // after a winner.
        if props.use_martingale && total < 0.0 {
            self.next_lots = (self.next_lots * props.martingale_multiplier).min(props.max_open_lots);
        } else {
            self.next_lots = self.base_lots;
        }
    }

    fn reduce(
        &mut self,
        bar: usize,
        position: &mut OpenPosition,
        price: f64,
        lots_off: f64,
    ) {
        let pnl = position.dir * (price - position.price) * lots_off * LOT_UNITS;
        self.balance += pnl;
        position.realized += pnl;
        position.lots -= lots_off;
        self.record(bar, position.dir, lots_off, Transaction::Reduce, price, pnl);
    }
}

impl SimBacktester {
    fn validate(&self, config: &Configuration, n: usize) -> Result<(), BacktestFault> {
        if n == 0 {
            return Err(BacktestFault::new("empty dataset"));
        }
        if !config.structure_is_valid() {
            return Err(BacktestFault::new("configuration slots are out of order"));
        }
        for slot in &config.slots {
            if !slot.is_defined || slot.components.is_empty() {
                return Err(BacktestFault::new(format!(
                    "slot {} ('{}') has no calculated components",
                    slot.index, slot.indicator
                )));
            }
            if slot.components[0].values.len() != n {
                return Err(BacktestFault::new(format!(
                    "slot {} ('{}') component length mismatch",
                    slot.index, slot.indicator
                )));
            }
        }
        Ok(())
    }

    /// Protection price for the current bar, if any. Break-even (once
    /// armed) ratchets the stop to the average entry price.
    fn stop_price(position: &OpenPosition, config: &Configuration) -> Option<f64> {
        let props = &config.props;
        let mut stop = if props.use_permanent_sl {
            let anchor = match props.permanent_sl_type {
                ProtectionType::Relative => position.price,
                ProtectionType::Absolute => position.anchor,
            };
            Some(anchor - position.dir * props.permanent_sl * POINT)
        } else {
            None
        };
        if position.be_done {
            stop = Some(match stop {
                Some(s) if position.dir > 0.0 => s.max(position.price),
                Some(s) => s.min(position.price),
                None => position.price,
            });
        }
        stop
    }
}

impl Backtester for SimBacktester {
    fn run(
        &self,
        config: &Configuration,
        dataset: &Dataset,
    ) -> Result<BacktestReport, BacktestFault> {
        let n = dataset.bar_count();
        self.validate(config, n)?;

        let entry = &config.slots[config.entry_slot()];
        let exit = &config.slots[config.exit_slot()];
        let entry_filters: Vec<&SlotSpec> = config.slots_of(SlotKind::EntryFilter).collect();
        let exit_filters: Vec<&SlotSpec> = config.slots_of(SlotKind::ExitFilter).collect();
        let props = &config.props;
        let first = config.first_bar().min(n);

        let mut state = SimState {
            balance: self.initial_account,
            base_lots: props.entry_lots,
            next_lots: props.entry_lots,
            number: 0,
            positions: Vec::new(),
            trades: Vec::new(),
        };
        let mut curve = Vec::with_capacity(n);
        let mut open: Option<OpenPosition> = None;

        for i in 0..n {
            if i < first {
                curve.push(state.balance);
                continue;
            }
            let bar = &dataset.bars[i];

            // Intrabar protection: arm break-even, then stop, then take.
            if let Some(position) = open.as_mut() {
                if props.use_break_even && !position.be_done {
                    let trigger = position.price + position.dir * props.break_even * POINT;
                    let reached = if position.dir > 0.0 {
                        bar.high >= trigger
                    } else {
                        bar.low <= trigger
                    };
                    if reached {
                        position.be_done = true;
                    }
                }
            }

            let stop_hit = open.as_ref().and_then(|position| {
                Self::stop_price(position, config).filter(|&stop| {
                    if position.dir > 0.0 {
                        bar.low <= stop
                    } else {
                        bar.high >= stop
                    }
                })
            });
            if let Some(stop) = stop_hit {
                let position = open.take().unwrap();
                state.close(i, position, stop, config, Transaction::Close);
            }

            let take_hit = open.as_ref().and_then(|position| {
                if !props.use_permanent_tp {
                    return None;
                }
                let anchor = match props.permanent_tp_type {
                    ProtectionType::Relative => position.price,
                    ProtectionType::Absolute => position.anchor,
                };
                let take = anchor + position.dir * props.permanent_tp * POINT;
                let hit = if position.dir > 0.0 {
                    bar.high >= take
                } else {
                    bar.low <= take
                };
                hit.then_some(take)
            });
            if let Some(take) = take_hit {
                let position = open.take().unwrap();
                state.close(i, position, take, config, Transaction::Close);
            }

            // Exit logic at bar close: exit signal AND all exit filters.
            if open.is_some() {
                let fires = exit.action(i) >= 0.5
                    && exit_filters.iter().all(|f| f.action(i) >= 0.5);
                if fires {
                    let position = open.take().unwrap();
                    state.close(i, position, bar.close, config, Transaction::Close);
                }
            }

            // Entry logic at bar close. Decide first, then act, so the
            // position option is never borrowed across a take().
            let dir = entry.action(i);
            let allowed = entry_filters.iter().all(|f| f.action(i) >= 0.5);
            if dir != 0.0 && allowed {
                enum Decision {
                    Open,
                    Add { only_if_winning: bool },
                    Reduce,
                    Close,
                    Reverse,
                    Ignore,
                }
                let decision = match open.as_ref() {
                    None => Decision::Open,
                    Some(position) if position.dir == dir => match props.same_signal_action {
                        SameDirAction::Nothing => Decision::Ignore,
                        SameDirAction::Add => Decision::Add {
                            only_if_winning: false,
                        },
                        SameDirAction::Winner => Decision::Add {
                            only_if_winning: true,
                        },
                    },
                    Some(_) => match props.opp_signal_action {
                        OppositeDirAction::Nothing => Decision::Ignore,
                        OppositeDirAction::Reduce => Decision::Reduce,
                        OppositeDirAction::Close => Decision::Close,
                        OppositeDirAction::Reverse => Decision::Reverse,
                    },
                };

                match decision {
                    Decision::Open => {
                        open = Some(state.open(i, dir, bar.close, config, self.initial_account));
                    }
                    Decision::Add { only_if_winning } => {
                        if let Some(position) = open.as_mut() {
                            let winning = position.dir * (bar.close - position.price) > 0.0;
                            let add = props.adding_lots;
                            if (!only_if_winning || winning)
                                && position.lots + add <= props.max_open_lots
                            {
                                position.price = (position.price * position.lots
                                    + bar.close * add)
                                    / (position.lots + add);
                                position.lots += add;
                                state.record(i, position.dir, add, Transaction::Add, bar.close, 0.0);
                            }
                        }
                    }
                    Decision::Reduce => {
                        let full_close = open
                            .as_ref()
                            .is_some_and(|p| props.reducing_lots >= p.lots);
                        if full_close {
                            let position = open.take().unwrap();
                            state.close(i, position, bar.close, config, Transaction::Close);
                        } else if let Some(position) = open.as_mut() {
                            let lots_off = props.reducing_lots.min(position.lots);
                            state.reduce(i, position, bar.close, lots_off);
                        }
                    }
                    Decision::Close => {
                        let position = open.take().unwrap();
                        state.close(i, position, bar.close, config, Transaction::Close);
                    }
                    Decision::Reverse => {
                        let position = open.take().unwrap();
                        state.close(i, position, bar.close, config, Transaction::Reverse);
                        open = Some(state.open(i, dir, bar.close, config, self.initial_account));
                    }
                    Decision::Ignore => {}
                }
            }

            curve.push(state.balance);
        }

        // Force-close anything still open on the last bar.
        if let Some(position) = open.take() {
            let last = n - 1;
            state.close(
                last,
                position,
                dataset.bars[last].close,
                config,
                Transaction::Close,
            );
            if let Some(value) = curve.last_mut() {
                *value = state.balance;
            }
        }

        let stats = AccountStats::compute(
            curve,
            &state.trades,
            self.initial_account,
            dataset.granularity.bars_per_year(),
        );
        Ok(BacktestReport {
            stats,
            positions: state.positions,
        })
    }
}
