//! Micro-benchmarks for candidate construction and evaluation.

use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use rulelab_core::{
    Backtester, Bar, BuiltinCatalog, Configuration, Dataset, Granularity, SimBacktester,
    StrategyProperties,
};
use rulelab_search::{
    detect_locks, CarryOver, ConfigSampler, EligibleIndicators, IndicatorBlacklist, SearchConfig,
};

fn wavy_dataset(n: usize) -> Dataset {
    use chrono::{Duration, NaiveDate};
    let start = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let bars = (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.45).sin() * 4.0 + i as f64 * 0.02;
            Bar {
                time: start + Duration::hours(i as i64),
                open: close - 0.1,
                high: close + 0.6,
                low: close - 0.7,
                close,
                volume: 1_000,
            }
        })
        .collect();
    Dataset::new("BENCH", Granularity::Hour, bars)
}

fn bench_sampling(c: &mut Criterion) {
    let props = StrategyProperties::default();
    let eligible = EligibleIndicators::build(&BuiltinCatalog, Granularity::Hour, &props);
    let template = Configuration::new(0, 0);
    let carry = CarryOver::snapshot(&template);
    let search = SearchConfig::default();
    let locks = detect_locks(
        &carry,
        &eligible,
        search.max_entry_filters,
        search.max_exit_filters,
    );
    let dataset = wavy_dataset(2_000);
    let sampler = ConfigSampler {
        provider: &BuiltinCatalog,
        eligible: &eligible,
        carry: &carry,
        locks,
        template_props: &props,
        search: &search,
        dataset: &dataset,
    };
    let blacklist = IndicatorBlacklist::new();

    c.bench_function("sample_candidate_2000_bars", |b| {
        let mut rng = StdRng::seed_from_u64(42);
        let mut calculations = 0;
        b.iter(|| {
            sampler
                .sample(&blacklist, &mut rng, &mut calculations)
                .expect("sampling failed")
        })
    });

    c.bench_function("sample_and_backtest_2000_bars", |b| {
        let mut rng = StdRng::seed_from_u64(42);
        let mut calculations = 0;
        let backtester = SimBacktester::default();
        b.iter(|| {
            let mut config = sampler
                .sample(&blacklist, &mut rng, &mut calculations)
                .expect("sampling failed");
            config.assign_default_groups();
            backtester.run(&config, &dataset).expect("backtest failed")
        })
    });
}

criterion_group!(benches, bench_sampling);
criterion_main!(benches);
