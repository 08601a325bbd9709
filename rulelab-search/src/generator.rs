//! Generation loop controller.
//!
//! States: Idle -> Running -> {Cancelled, TimedOut, Exhausted} -> Idle.
//! The loop polls the cancellation flag and the deadline once per cycle,
//! never mid-cycle, so the best configuration always comes from a fully
//! evaluated candidate. There is no cycle-count budget.
//!
//! `GenerationSession::run` is the synchronous engine; `spawn_generation`
//! wraps it in a dedicated background thread with an event channel and a
//! shared cancellation flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use rulelab_core::indicators::{Indicator, IndicatorProvider};
use rulelab_core::{Backtester, Configuration, Dataset, RngHierarchy, RunId, SlotKind};

use crate::blacklist::IndicatorBlacklist;
use crate::config::SearchConfig;
use crate::eligibility::EligibleIndicators;
use crate::error::{CycleFault, SearchError};
use crate::evaluator::FitnessEvaluator;
use crate::leaderboard::{BestTracker, FitnessRecord};
use crate::progress::ProgressGauge;
use crate::sampler::{detect_locks, CarryOver, ConfigSampler};
use crate::scoring::CustomScorer;

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The caller requested cancellation.
    Cancelled,
    /// The wall-clock budget expired.
    TimedOut,
    /// No eligible indicator remained for a slot kind.
    Exhausted { kind: SlotKind },
}

/// One-way notifications emitted while Running.
#[derive(Debug, Clone)]
pub enum GenerationEvent {
    /// Elapsed-budget percentage; monotonic, at most once per integer.
    Progress { percent: u8 },
    /// The tracker accepted a new best.
    Improvement {
        score: f64,
        label: String,
        description: String,
    },
    /// A non-fatal fault (backtest, calculation, scoring).
    Notice { message: String },
}

/// Final report of one run.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub outcome: RunOutcome,
    /// Candidates fully evaluated this run.
    pub cycles: u64,
    /// Indicator and backtest calculations across the session.
    pub calculations: u64,
    /// Calculation-rate benchmark: 1e-4 * bars * calculations / seconds.
    pub benchmark: f64,
    pub elapsed: Duration,
    pub best: Option<FitnessRecord>,
    pub nominations: Vec<FitnessRecord>,
    pub history: Vec<String>,
    pub blacklist: Vec<String>,
}

/// A generation session: owns the template configuration and the
/// leaderboard across runs, plus the collaborating capabilities.
pub struct GenerationSession {
    provider: Arc<dyn IndicatorProvider>,
    backtester: Arc<dyn Backtester>,
    scorer: Option<Arc<dyn CustomScorer>>,
    dataset: Arc<Dataset>,
    search: SearchConfig,
    template: Configuration,
    tracker: BestTracker,
    total_calculations: u64,
    total_work: Duration,
    runs: u64,
}

impl GenerationSession {
    pub fn new(
        provider: Arc<dyn IndicatorProvider>,
        backtester: Arc<dyn Backtester>,
        dataset: Arc<Dataset>,
        search: SearchConfig,
        template: Configuration,
    ) -> Self {
        let tracker = BestTracker::new(search.nominations);
        Self {
            provider,
            backtester,
            scorer: None,
            dataset,
            search,
            template,
            tracker,
            total_calculations: 0,
            total_work: Duration::ZERO,
            runs: 0,
        }
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn CustomScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// The working configuration; after a run this is the restored best.
    pub fn template(&self) -> &Configuration {
        &self.template
    }

    pub fn tracker(&self) -> &BestTracker {
        &self.tracker
    }

    pub fn search(&self) -> &SearchConfig {
        &self.search
    }

    /// Execute one run synchronously.
    ///
    /// `budget` of `None` runs until cancelled. Events are delivered
    /// through `on_event`; the flag in `cancel` is polled once per cycle.
    pub fn run(
        &mut self,
        budget: Option<Duration>,
        preserve_leaderboard: bool,
        cancel: &AtomicBool,
        mut on_event: impl FnMut(GenerationEvent),
    ) -> Result<GenerationReport, SearchError> {
        let eligible = EligibleIndicators::build(
            self.provider.as_ref(),
            self.dataset.granularity,
            &self.template.props,
        );
        let carry = CarryOver::snapshot(&self.template);
        let locks = detect_locks(
            &carry,
            &eligible,
            self.search.max_entry_filters,
            self.search.max_exit_filters,
        );
        if locks.entry_locked && locks.exit_locked {
            return Err(SearchError::NoSearchSpace);
        }
        eligible.check_available(
            &carry,
            locks.max_entry_filters,
            locks.max_exit_filters,
            locks.entry_locked,
            locks.exit_locked,
        )?;

        if !preserve_leaderboard {
            // Fresh search: only positive scores may become best.
            self.tracker.reset(0.0);
        }

        let run_id = RunId::new(format!("gen-{}-{}", self.search.seed, self.runs));
        self.runs += 1;
        let hierarchy = RngHierarchy::new(self.search.seed);
        let template_props = self.template.props.clone();

        let mut blacklist = IndicatorBlacklist::new();
        let mut gauge = ProgressGauge::new();
        let start = Instant::now();
        let work_before = self.total_work;
        let bars = self.dataset.bar_count() as f64;
        let mut cycles: u64 = 0;
        let mut attempts: u64 = 0;
        let mut benchmark = 0.0;

        info!(
            run_id = %run_id,
            budget_secs = budget.map(|b| b.as_secs()),
            preserve_leaderboard,
            "generation run started"
        );

        let outcome = {
            let sampler = ConfigSampler {
                provider: self.provider.as_ref(),
                eligible: &eligible,
                carry: &carry,
                locks,
                template_props: &template_props,
                search: &self.search,
                dataset: self.dataset.as_ref(),
            };
            let evaluator = FitnessEvaluator {
                backtester: self.backtester.as_ref(),
                scorer: self.scorer.as_deref(),
                scoring: &self.search.scoring,
                criteria: &self.search.criteria,
                money: &self.search.money,
                oos_bar: self.search.oos_bar,
                accept_equal: self.search.accept_equal_score,
            };

            loop {
                // Exit conditions, checked only at cycle boundaries.
                if cancel.load(Ordering::Relaxed) {
                    break RunOutcome::Cancelled;
                }
                if let Some(limit) = budget {
                    if start.elapsed() >= limit {
                        break RunOutcome::TimedOut;
                    }
                }

                let mut rng = hierarchy.rng_for(&run_id, "cycle", attempts);
                attempts += 1;

                match sampler.sample(&blacklist, &mut rng, &mut self.total_calculations) {
                    Ok(mut candidate) => {
                        cycles += 1;
                        let result = evaluator.assess_with_lot_ladder(
                            &mut candidate,
                            self.dataset.as_ref(),
                            &mut self.tracker,
                            &mut self.total_calculations,
                        );
                        if let Some(message) = result.notice {
                            warn!(%message, "candidate fault");
                            on_event(GenerationEvent::Notice { message });
                        }
                        if result.better {
                            if let Some(best) = self.tracker.best() {
                                let description =
                                    self.tracker.history().last().cloned().unwrap_or_default();
                                info!(score = best.score, label = %best.label, "new best");
                                on_event(GenerationEvent::Improvement {
                                    score: best.score,
                                    label: best.label.clone(),
                                    description,
                                });
                            }
                        }
                    }
                    Err(CycleFault::Calculation(fault)) => {
                        blacklist.insert(fault.indicator.clone());
                        warn!(indicator = %fault.indicator, "calculation fault, blacklisted");
                        on_event(GenerationEvent::Notice {
                            message: fault.to_string(),
                        });
                    }
                    Err(CycleFault::WarmupExhausted { indicator }) => {
                        on_event(GenerationEvent::Notice {
                            message: format!(
                                "indicator '{indicator}' warms up too late, candidate dropped"
                            ),
                        });
                    }
                    Err(CycleFault::SpaceExhaustion { kind }) => {
                        warn!(?kind, "search space exhausted");
                        on_event(GenerationEvent::Notice {
                            message: format!("search space exhausted for {kind:?} slots"),
                        });
                        break RunOutcome::Exhausted { kind };
                    }
                }

                self.total_work = work_before + start.elapsed();
                let seconds = self.total_work.as_secs_f64();
                if seconds > 0.0 {
                    benchmark = 1e-4 * bars * self.total_calculations as f64 / seconds;
                }

                if let Some(limit) = budget {
                    if let Some(percent) = gauge.update(start.elapsed(), limit) {
                        on_event(GenerationEvent::Progress { percent });
                    }
                }
            }
        };

        // Restore the working configuration from the best and re-derive
        // every slot's indicator output.
        if let Some(best) = self.tracker.best().cloned() {
            self.template = best.config;
            self.recalculate_slots()?;
        }
        self.total_work = work_before + start.elapsed();

        info!(?outcome, cycles, "generation run finished");
        Ok(GenerationReport {
            outcome,
            cycles,
            calculations: self.total_calculations,
            benchmark,
            elapsed: start.elapsed(),
            best: self.tracker.best().cloned(),
            nominations: self.tracker.nominations().to_vec(),
            history: self.tracker.history().to_vec(),
            blacklist: blacklist.names().map(str::to_string).collect(),
        })
    }

    /// Recompute all slot components against the dataset. A pure
    /// re-derivation step, not a search cycle.
    fn recalculate_slots(&mut self) -> Result<(), SearchError> {
        for slot in &mut self.template.slots {
            let mut indicator = self
                .provider
                .construct(&slot.indicator)
                .map_err(|e| SearchError::Restore(e.to_string()))?;
            indicator.initialize(slot.kind);
            indicator.set_params(slot.params.clone());
            indicator
                .calculate(self.dataset.as_ref())
                .map_err(|e| SearchError::Restore(e.to_string()))?;
            slot.components = indicator.components().to_vec();
            slot.chart = indicator.chart_meta();
            slot.is_defined = true;
            self.total_calculations += 1;
        }
        Ok(())
    }
}

/// Handle to a generation run on its background thread.
pub struct GenerationHandle {
    events: Receiver<GenerationEvent>,
    cancel: Arc<AtomicBool>,
    join: JoinHandle<(GenerationSession, Result<GenerationReport, SearchError>)>,
}

impl GenerationHandle {
    /// Request cooperative cancellation; honored at the next cycle
    /// boundary, after the in-flight candidate completes.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// The event stream. Closes when the run finishes.
    pub fn events(&self) -> &Receiver<GenerationEvent> {
        &self.events
    }

    /// Wait for the run and get the session back with its report.
    pub fn join(self) -> (GenerationSession, Result<GenerationReport, SearchError>) {
        self.join.join().expect("generation thread panicked")
    }
}

/// Start a run on a dedicated background thread.
pub fn spawn_generation(
    mut session: GenerationSession,
    budget_minutes: Option<u32>,
    preserve_leaderboard: bool,
) -> GenerationHandle {
    let (tx, rx) = channel();
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    let join = thread::Builder::new()
        .name("rulelab-generation".into())
        .spawn(move || {
            let budget = budget_minutes.map(|m| Duration::from_secs(u64::from(m) * 60));
            let result = session.run(budget, preserve_leaderboard, &flag, |event| {
                let _ = tx.send(event);
            });
            (session, result)
        })
        .expect("failed to spawn generation thread");
    GenerationHandle {
        events: rx,
        cancel,
        join,
    }
}
