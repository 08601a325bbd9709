//! End-to-end generation scenarios.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use rulelab_core::indicators::{
    CalculationFault, Indicator, IndicatorProvider, UnknownIndicator,
};
use rulelab_core::params::ParamSet;
use rulelab_core::strategy::IndicatorComponent;
use rulelab_core::{
    Bar, BuiltinCatalog, Configuration, Dataset, Granularity, SimBacktester, SlotKind, SlotStatus,
};
use rulelab_search::{
    spawn_generation, GenerationEvent, GenerationSession, RunOutcome, SearchConfig, SearchError,
};

fn wavy_dataset(n: usize) -> Dataset {
    use chrono::{Duration as ChronoDuration, NaiveDate};
    let start = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let bars = (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.45).sin() * 4.0 + i as f64 * 0.02;
            Bar {
                time: start + ChronoDuration::hours(i as i64),
                open: close - 0.1,
                high: close + 0.6,
                low: close - 0.7,
                close,
                volume: 1_000,
            }
        })
        .collect();
    Dataset::new("TEST", Granularity::Hour, bars)
}

fn session_with(search: SearchConfig, template: Configuration, bars: usize) -> GenerationSession {
    GenerationSession::new(
        Arc::new(BuiltinCatalog),
        Arc::new(SimBacktester::default()),
        Arc::new(wavy_dataset(bars)),
        search,
        template,
    )
}

#[test]
fn budgeted_run_times_out_with_profitable_or_empty_best() {
    // 500 bars, one unlocked entry signal slot, zero filters, net-balance
    // scoring, fresh leaderboard.
    let search = SearchConfig {
        max_entry_filters: 0,
        max_exit_filters: 0,
        ..SearchConfig::default()
    };
    let mut session = session_with(search, Configuration::new(0, 0), 500);

    let cancel = AtomicBool::new(false);
    let report = session
        .run(Some(Duration::from_millis(400)), false, &cancel, |_| {})
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::TimedOut);
    assert!(report.cycles > 0);
    match &report.best {
        Some(best) => {
            assert!(best.score > 0.0, "best must be strictly profitable");
            assert!(best.config.structure_is_valid());
            assert_eq!(best.config.entry_filter_count(), 0);
            assert_eq!(best.config.exit_filter_count(), 0);
        }
        None => {
            // No profitable candidate existed; the leaderboard stays empty.
            assert!(report.history.is_empty());
        }
    }
}

#[test]
fn fully_locked_start_is_refused_through_the_handle() {
    let mut template = Configuration::new(0, 0);
    template.slots[0].status = SlotStatus::Locked;
    template.slots[0].indicator = "MA Crossover".into();
    template.slots[1].status = SlotStatus::Locked;
    template.slots[1].indicator = "Donchian Channel".into();

    let search = SearchConfig {
        max_entry_filters: 0,
        max_exit_filters: 0,
        ..SearchConfig::default()
    };
    let session = session_with(search, template, 300);

    let handle = spawn_generation(session, None, false);
    let (_session, result) = handle.join();
    assert!(matches!(result, Err(SearchError::NoSearchSpace)));
}

#[test]
fn progress_percentages_are_distinct_and_increasing() {
    let search = SearchConfig::default();
    let mut session = session_with(search, Configuration::new(0, 0), 300);

    let mut percents = Vec::new();
    let cancel = AtomicBool::new(false);
    session
        .run(Some(Duration::from_millis(300)), false, &cancel, |event| {
            if let GenerationEvent::Progress { percent } = event {
                percents.push(percent);
            }
        })
        .unwrap();

    assert!(!percents.is_empty(), "a budgeted run must report progress");
    for pair in percents.windows(2) {
        assert!(pair[1] > pair[0], "progress regressed: {percents:?}");
    }
    assert!(*percents.last().unwrap() <= 100);
}

#[test]
fn cancellation_surfaces_only_fully_evaluated_bests() {
    let session = session_with(SearchConfig::default(), Configuration::new(0, 0), 400);
    let handle = spawn_generation(session, None, false);

    std::thread::sleep(Duration::from_millis(250));
    handle.cancel();
    let (session, result) = handle.join();
    let report = result.unwrap();

    assert_eq!(report.outcome, RunOutcome::Cancelled);
    if let Some(best) = &report.best {
        assert!(best.config.structure_is_valid());
        for slot in &best.config.slots {
            assert!(slot.is_defined, "partially built slot surfaced as best");
        }
        // The working template was restored from the best and re-derived.
        let template = session.template();
        assert_eq!(template.slot_count(), best.config.slot_count());
        for slot in &template.slots {
            assert!(slot.is_defined);
            assert!(!slot.components.is_empty());
        }
    }
}

#[test]
fn preserved_leaderboard_keeps_the_best_across_runs() {
    let mut session = session_with(SearchConfig::default(), Configuration::new(0, 0), 400);
    let cancel = AtomicBool::new(false);

    let first = session
        .run(Some(Duration::from_millis(250)), false, &cancel, |_| {})
        .unwrap();
    let Some(first_best) = first.best else {
        // Nothing profitable on this dataset; the scenario is vacuous.
        return;
    };

    let second = session
        .run(Some(Duration::from_millis(250)), true, &cancel, |_| {})
        .unwrap();
    let second_best = second.best.expect("preserved leaderboard lost its best");
    assert!(second_best.score >= first_best.score);

    // A fresh run resets the leaderboard before searching again.
    let third = session
        .run(Some(Duration::from_millis(100)), false, &cancel, |_| {})
        .unwrap();
    for record in &third.nominations {
        assert!(record.score > 0.0);
    }
}

// ─── Always-faulting indicator ───────────────────────────────────────

#[derive(Default)]
struct Poltergeist {
    kind: Option<SlotKind>,
    params: ParamSet,
}

impl Indicator for Poltergeist {
    fn name(&self) -> &str {
        "Poltergeist"
    }

    fn supported_kinds(&self) -> &[SlotKind] {
        &[SlotKind::EntrySignal]
    }

    fn initialize(&mut self, kind: SlotKind) {
        self.kind = Some(kind);
        self.params = ParamSet::default();
    }

    fn kind(&self) -> SlotKind {
        self.kind.unwrap_or(SlotKind::EntrySignal)
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn calculate(&mut self, _dataset: &Dataset) -> Result<(), CalculationFault> {
        Err(CalculationFault {
            indicator: "Poltergeist".into(),
            kind: self.kind(),
            message: "haunted parameters".into(),
        })
    }

    fn components(&self) -> &[IndicatorComponent] {
        &[]
    }
}

struct HauntedCatalog;

impl IndicatorProvider for HauntedCatalog {
    fn names(&self) -> Vec<String> {
        let mut names = BuiltinCatalog.names();
        names.push("Poltergeist".into());
        names
    }

    fn construct(&self, name: &str) -> Result<Box<dyn Indicator>, UnknownIndicator> {
        if name == "Poltergeist" {
            Ok(Box::new(Poltergeist::default()))
        } else {
            BuiltinCatalog.construct(name)
        }
    }
}

#[test]
fn faulting_indicator_is_blacklisted_and_never_reused() {
    let mut session = GenerationSession::new(
        Arc::new(HauntedCatalog),
        Arc::new(SimBacktester::default()),
        Arc::new(wavy_dataset(400)),
        SearchConfig::default(),
        Configuration::new(0, 0),
    );

    let cancel = AtomicBool::new(false);
    let report = session
        .run(Some(Duration::from_millis(400)), false, &cancel, |_| {})
        .unwrap();

    assert!(
        report.blacklist.iter().any(|n| n == "Poltergeist"),
        "faulting indicator must end up blacklisted"
    );
    assert!(report.cycles > 0, "the run must keep generating after the fault");
    if let Some(best) = &report.best {
        for slot in &best.config.slots {
            assert_ne!(slot.indicator, "Poltergeist");
        }
    }
    for record in &report.nominations {
        for slot in &record.config.slots {
            assert_ne!(slot.indicator, "Poltergeist");
        }
    }
}
