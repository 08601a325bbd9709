//! Built-in indicator catalog — the reference `IndicatorProvider`.
//!
//! Each entry is a blueprint: supported slot kinds, per-kind parameter
//! domains, and a compute function that resolves component series. The
//! action series (component 0) uses +1/-1/0 for entry signals and 1/0 for
//! filters and exits.

use crate::domain::Dataset;
use crate::params::{ListParam, NumericParam, ParamSet};
use crate::strategy::{ChartMeta, IndicatorComponent, SlotKind};

use super::{math, CalculationFault, Indicator, IndicatorProvider, UnknownIndicator};

type ParamsFn = fn(SlotKind) -> ParamSet;
type ComputeFn = fn(&ParamSet, SlotKind, &Dataset) -> Result<Vec<IndicatorComponent>, String>;
type ChartFn = fn(&ParamSet) -> ChartMeta;

struct Blueprint {
    name: &'static str,
    kinds: &'static [SlotKind],
    generatable: bool,
    supports_exit_filters: bool,
    intraday_only: bool,
    params_for: ParamsFn,
    compute: ComputeFn,
    chart: ChartFn,
}

static CATALOG: &[Blueprint] = &[
    Blueprint {
        name: "MA Crossover",
        kinds: &[SlotKind::EntrySignal, SlotKind::EntryFilter],
        generatable: true,
        supports_exit_filters: false,
        intraday_only: false,
        params_for: ma_crossover_params,
        compute: ma_crossover_compute,
        chart: overlay_chart,
    },
    Blueprint {
        name: "Moving Average",
        kinds: &[
            SlotKind::EntryFilter,
            SlotKind::ExitSignal,
            SlotKind::ExitFilter,
        ],
        generatable: true,
        supports_exit_filters: true,
        intraday_only: false,
        params_for: moving_average_params,
        compute: moving_average_compute,
        chart: overlay_chart,
    },
    Blueprint {
        name: "Donchian Channel",
        kinds: &[SlotKind::EntrySignal, SlotKind::ExitSignal],
        generatable: true,
        supports_exit_filters: false,
        intraday_only: false,
        params_for: donchian_params,
        compute: donchian_compute,
        chart: overlay_chart,
    },
    Blueprint {
        name: "RSI",
        kinds: &[SlotKind::EntryFilter, SlotKind::ExitFilter],
        generatable: true,
        supports_exit_filters: false,
        intraday_only: false,
        params_for: rsi_params,
        compute: rsi_compute,
        chart: rsi_chart,
    },
    Blueprint {
        name: "Momentum",
        kinds: &[SlotKind::EntrySignal, SlotKind::EntryFilter],
        generatable: true,
        supports_exit_filters: false,
        intraday_only: false,
        params_for: momentum_params,
        compute: momentum_compute,
        chart: momentum_chart,
    },
    Blueprint {
        name: "Entry Time",
        kinds: &[SlotKind::EntrySignal, SlotKind::EntryFilter],
        generatable: true,
        supports_exit_filters: false,
        intraday_only: true,
        params_for: entry_time_params,
        compute: entry_time_compute,
        chart: overlay_chart,
    },
    Blueprint {
        name: "Bar Closing",
        kinds: &[SlotKind::ExitSignal],
        generatable: true,
        supports_exit_filters: true,
        intraday_only: false,
        params_for: no_params,
        compute: bar_closing_compute,
        chart: overlay_chart,
    },
    Blueprint {
        name: "Close and Reverse",
        kinds: &[SlotKind::ExitSignal],
        generatable: true,
        supports_exit_filters: true,
        intraday_only: false,
        params_for: no_params,
        compute: close_and_reverse_compute,
        chart: overlay_chart,
    },
];

// ─── Parameter domains ───────────────────────────────────────────────

const BASE_PRICES: [&str; 5] = ["Close", "Open", "High", "Low", "Median"];

fn base_price_param() -> ListParam {
    ListParam::new("Base price", &BASE_PRICES, 0)
}

fn logic_param(subject: &str) -> ListParam {
    let items = [
        format!("{subject} rises"),
        format!("{subject} falls"),
        format!("{subject} is higher than the Level line"),
        format!("{subject} is lower than the Level line"),
    ];
    ListParam {
        caption: "Logic".into(),
        items: items.to_vec(),
        index: 0,
        enabled: true,
    }
}

fn ma_crossover_params(_kind: SlotKind) -> ParamSet {
    ParamSet {
        list: vec![base_price_param()],
        num: vec![
            NumericParam::new(
                "Fast period",
                "period of the fast moving average",
                10.0,
                2.0,
                50.0,
                0,
            ),
            NumericParam::new(
                "Slow period",
                "period of the slow moving average",
                50.0,
                5.0,
                200.0,
                0,
            ),
        ],
    }
}

fn moving_average_params(_kind: SlotKind) -> ParamSet {
    ParamSet {
        list: vec![
            base_price_param(),
            ListParam::new("Method", &["Simple", "Exponential"], 0),
        ],
        num: vec![
            NumericParam::new("Period", "period of the moving average", 20.0, 5.0, 200.0, 0),
            NumericParam::new(
                "Shift",
                "forward shift of the moving average line",
                0.0,
                0.0,
                10.0,
                0,
            ),
        ],
    }
}

fn donchian_params(_kind: SlotKind) -> ParamSet {
    ParamSet {
        list: vec![],
        num: vec![NumericParam::new(
            "Period",
            "channel lookback period",
            20.0,
            10.0,
            100.0,
            0,
        )],
    }
}

fn rsi_params(_kind: SlotKind) -> ParamSet {
    ParamSet {
        list: vec![logic_param("RSI")],
        num: vec![
            NumericParam::new("Period", "smoothing period of RSI", 14.0, 5.0, 50.0, 0),
            NumericParam::new("Level", "signal level", 30.0, 10.0, 90.0, 0),
        ],
    }
}

fn momentum_params(_kind: SlotKind) -> ParamSet {
    ParamSet {
        list: vec![logic_param("Momentum"), base_price_param()],
        num: vec![
            NumericParam::new("Period", "period of momentum", 10.0, 5.0, 50.0, 0),
            NumericParam::new("Level", "signal level", 0.0, -5.0, 5.0, 1),
        ],
    }
}

fn entry_time_params(_kind: SlotKind) -> ParamSet {
    ParamSet {
        list: vec![],
        num: vec![
            NumericParam::new("From hour", "start of the trading window", 8.0, 0.0, 23.0, 0),
            NumericParam::new("Until hour", "end of the trading window", 18.0, 0.0, 23.0, 0),
        ],
    }
}

fn no_params(_kind: SlotKind) -> ParamSet {
    ParamSet::default()
}

// ─── Chart metadata ──────────────────────────────────────────────────

fn overlay_chart(_params: &ParamSet) -> ChartMeta {
    ChartMeta::default()
}

fn rsi_chart(params: &ParamSet) -> ChartMeta {
    let level = params.num_value("Level").unwrap_or(30.0);
    ChartMeta {
        separate_pane: true,
        min_value: 0.0,
        max_value: 100.0,
        special_values: vec![level, 100.0 - level],
    }
}

fn momentum_chart(params: &ParamSet) -> ChartMeta {
    let level = params.num_value("Level").unwrap_or(0.0);
    ChartMeta {
        separate_pane: true,
        min_value: f64::NAN,
        max_value: f64::NAN,
        special_values: vec![level, -level],
    }
}

// ─── Compute functions ───────────────────────────────────────────────

fn check_dataset(dataset: &Dataset) -> Result<usize, String> {
    if dataset.is_empty() {
        return Err("empty dataset".into());
    }
    Ok(dataset.bar_count())
}

fn period_of(params: &ParamSet, caption: &str, fallback: f64) -> usize {
    params.num_value(caption).unwrap_or(fallback).max(1.0) as usize
}

fn ma_crossover_compute(
    params: &ParamSet,
    kind: SlotKind,
    dataset: &Dataset,
) -> Result<Vec<IndicatorComponent>, String> {
    let n = check_dataset(dataset)?;
    let price = math::price_series(dataset, params.list_text("Base price").unwrap_or("Close"));
    let fast_period = period_of(params, "Fast period", 10.0);
    let slow_period = period_of(params, "Slow period", 50.0);
    let fast = math::sma(&price, fast_period);
    let slow = math::sma(&price, slow_period);

    let mut action = vec![0.0; n];
    for i in 1..n {
        if !(fast[i].is_finite()
            && slow[i].is_finite()
            && fast[i - 1].is_finite()
            && slow[i - 1].is_finite())
        {
            continue;
        }
        match kind {
            SlotKind::EntrySignal => {
                if fast[i] > slow[i] && fast[i - 1] <= slow[i - 1] {
                    action[i] = 1.0;
                } else if fast[i] < slow[i] && fast[i - 1] >= slow[i - 1] {
                    action[i] = -1.0;
                }
            }
            _ => {
                if fast[i] > slow[i] {
                    action[i] = 1.0;
                }
            }
        }
    }

    let first_valid = fast_period.max(slow_period).min(n);
    Ok(vec![
        IndicatorComponent {
            name: action_name(kind).into(),
            first_valid_bar: first_valid,
            values: action,
        },
        IndicatorComponent {
            name: "Fast MA".into(),
            first_valid_bar: math::first_valid(&fast),
            values: fast,
        },
        IndicatorComponent {
            name: "Slow MA".into(),
            first_valid_bar: math::first_valid(&slow),
            values: slow,
        },
    ])
}

fn moving_average_compute(
    params: &ParamSet,
    kind: SlotKind,
    dataset: &Dataset,
) -> Result<Vec<IndicatorComponent>, String> {
    let n = check_dataset(dataset)?;
    let price = math::price_series(dataset, params.list_text("Base price").unwrap_or("Close"));
    let period = period_of(params, "Period", 20.0);
    let shift = params.num_value("Shift").unwrap_or(0.0).max(0.0) as usize;

    let ma = match params.list_text("Method") {
        Some("Exponential") => math::ema(&price, period),
        _ => math::sma(&price, period),
    };
    let mut shifted = vec![f64::NAN; n];
    for i in shift..n {
        shifted[i] = ma[i - shift];
    }

    let mut action = vec![0.0; n];
    for i in 1..n {
        if !(shifted[i].is_finite() && shifted[i - 1].is_finite()) {
            continue;
        }
        match kind {
            SlotKind::EntryFilter => {
                if price[i] > shifted[i] {
                    action[i] = 1.0;
                }
            }
            SlotKind::ExitSignal => {
                let above = price[i] > shifted[i];
                let was_above = price[i - 1] > shifted[i - 1];
                if above != was_above {
                    action[i] = 1.0;
                }
            }
            _ => {
                if price[i] < shifted[i] {
                    action[i] = 1.0;
                }
            }
        }
    }

    let first_valid = (period + shift).min(n);
    Ok(vec![
        IndicatorComponent {
            name: action_name(kind).into(),
            first_valid_bar: first_valid,
            values: action,
        },
        IndicatorComponent {
            name: "MA".into(),
            first_valid_bar: math::first_valid(&shifted),
            values: shifted,
        },
    ])
}

fn donchian_compute(
    params: &ParamSet,
    kind: SlotKind,
    dataset: &Dataset,
) -> Result<Vec<IndicatorComponent>, String> {
    let n = check_dataset(dataset)?;
    let period = period_of(params, "Period", 20.0);

    // Channel over the previous `period` bars, excluding the current bar.
    let mut upper = vec![f64::NAN; n];
    let mut lower = vec![f64::NAN; n];
    for i in period..n {
        let window = &dataset.bars[i - period..i];
        upper[i] = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        lower[i] = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    }

    let mut action = vec![0.0; n];
    for i in period..n {
        let close = dataset.bars[i].close;
        match kind {
            SlotKind::EntrySignal => {
                if close > upper[i] {
                    action[i] = 1.0;
                } else if close < lower[i] {
                    action[i] = -1.0;
                }
            }
            _ => {
                if i > period {
                    let mid = (upper[i] + lower[i]) / 2.0;
                    let prev_mid = (upper[i - 1] + lower[i - 1]) / 2.0;
                    let above = close > mid;
                    let was_above = dataset.bars[i - 1].close > prev_mid;
                    if above != was_above {
                        action[i] = 1.0;
                    }
                }
            }
        }
    }

    let first_valid = match kind {
        SlotKind::EntrySignal => period.min(n),
        _ => (period + 1).min(n),
    };
    Ok(vec![
        IndicatorComponent {
            name: action_name(kind).into(),
            first_valid_bar: first_valid,
            values: action,
        },
        IndicatorComponent {
            name: "Upper band".into(),
            first_valid_bar: period.min(n),
            values: upper,
        },
        IndicatorComponent {
            name: "Lower band".into(),
            first_valid_bar: period.min(n),
            values: lower,
        },
    ])
}

fn rsi_compute(
    params: &ParamSet,
    kind: SlotKind,
    dataset: &Dataset,
) -> Result<Vec<IndicatorComponent>, String> {
    let n = check_dataset(dataset)?;
    let closes = math::price_series(dataset, "Close");
    let period = period_of(params, "Period", 14.0);
    let level = params.num_value("Level").unwrap_or(30.0);
    let series = math::rsi(&closes, period);

    let action = logic_series(params, &series, level, n);
    let first_valid = (period + 1).min(n);
    Ok(vec![
        IndicatorComponent {
            name: action_name(kind).into(),
            first_valid_bar: first_valid,
            values: action,
        },
        IndicatorComponent {
            name: "RSI".into(),
            first_valid_bar: math::first_valid(&series),
            values: series,
        },
    ])
}

fn momentum_compute(
    params: &ParamSet,
    kind: SlotKind,
    dataset: &Dataset,
) -> Result<Vec<IndicatorComponent>, String> {
    let n = check_dataset(dataset)?;
    let price = math::price_series(dataset, params.list_text("Base price").unwrap_or("Close"));
    let period = period_of(params, "Period", 10.0);
    let level = params.num_value("Level").unwrap_or(0.0);
    let series = math::momentum(&price, period);

    let action = match kind {
        SlotKind::EntrySignal => {
            // +1 when the selected logic turns true, -1 when its paired
            // opposite logic turns true (rises/falls, higher/lower).
            let long = logic_series(params, &series, level, n);
            let short = opposite_logic_series(params, &series, level, n);
            let mut out = vec![0.0; n];
            for i in 1..n {
                if long[i] == 1.0 && long[i - 1] == 0.0 {
                    out[i] = 1.0;
                } else if short[i] == 1.0 && short[i - 1] == 0.0 {
                    out[i] = -1.0;
                }
            }
            out
        }
        _ => logic_series(params, &series, level, n),
    };

    let first_valid = (period + 1).min(n);
    Ok(vec![
        IndicatorComponent {
            name: action_name(kind).into(),
            first_valid_bar: first_valid,
            values: action,
        },
        IndicatorComponent {
            name: "Momentum".into(),
            first_valid_bar: math::first_valid(&series),
            values: series,
        },
    ])
}

fn entry_time_compute(
    params: &ParamSet,
    kind: SlotKind,
    dataset: &Dataset,
) -> Result<Vec<IndicatorComponent>, String> {
    let n = check_dataset(dataset)?;
    let from = params.num_value("From hour").unwrap_or(8.0) as u32;
    let until = params.num_value("Until hour").unwrap_or(18.0) as u32;

    let in_window = |hour: u32| {
        if from <= until {
            hour >= from && hour < until.max(from + 1)
        } else {
            hour >= from || hour < until
        }
    };

    let mut action = vec![0.0; n];
    for i in 0..n {
        let inside = in_window(dataset.bars[i].hour());
        match kind {
            SlotKind::EntrySignal => {
                let was_inside = i > 0 && in_window(dataset.bars[i - 1].hour());
                if inside && !was_inside {
                    action[i] = 1.0;
                }
            }
            _ => {
                if inside {
                    action[i] = 1.0;
                }
            }
        }
    }

    Ok(vec![IndicatorComponent {
        name: action_name(kind).into(),
        first_valid_bar: 0,
        values: action,
    }])
}

fn bar_closing_compute(
    _params: &ParamSet,
    kind: SlotKind,
    dataset: &Dataset,
) -> Result<Vec<IndicatorComponent>, String> {
    let n = check_dataset(dataset)?;
    Ok(vec![IndicatorComponent {
        name: action_name(kind).into(),
        first_valid_bar: 0,
        values: vec![1.0; n],
    }])
}

fn close_and_reverse_compute(
    _params: &ParamSet,
    kind: SlotKind,
    dataset: &Dataset,
) -> Result<Vec<IndicatorComponent>, String> {
    // The position is closed by the reversal itself; the exit series never
    // fires on its own.
    let n = check_dataset(dataset)?;
    Ok(vec![IndicatorComponent {
        name: action_name(kind).into(),
        first_valid_bar: 0,
        values: vec![0.0; n],
    }])
}

fn action_name(kind: SlotKind) -> &'static str {
    match kind {
        SlotKind::EntrySignal => "Entry direction",
        SlotKind::EntryFilter => "Entry allowance",
        SlotKind::ExitSignal => "Exit point",
        SlotKind::ExitFilter => "Exit allowance",
    }
}

/// Evaluate the selected "Logic" choice over a series: 1.0 where it holds.
fn logic_series(params: &ParamSet, series: &[f64], level: f64, n: usize) -> Vec<f64> {
    let index = params
        .list
        .iter()
        .find(|p| p.caption == "Logic")
        .map(|p| p.index)
        .unwrap_or(0);
    logic_series_for(index, series, level, n)
}

/// Same, for the paired opposite logic (rises/falls, higher/lower).
fn opposite_logic_series(params: &ParamSet, series: &[f64], level: f64, n: usize) -> Vec<f64> {
    let index = params
        .list
        .iter()
        .find(|p| p.caption == "Logic")
        .map(|p| p.index)
        .unwrap_or(0);
    logic_series_for(index ^ 1, series, level, n)
}

fn logic_series_for(index: usize, series: &[f64], level: f64, n: usize) -> Vec<f64> {
    let mut out = vec![0.0; n];
    for i in 1..n {
        if !series[i].is_finite() {
            continue;
        }
        let holds = match index {
            0 => series[i - 1].is_finite() && series[i] > series[i - 1],
            1 => series[i - 1].is_finite() && series[i] < series[i - 1],
            2 => series[i] > level,
            _ => series[i] < level,
        };
        if holds {
            out[i] = 1.0;
        }
    }
    out
}

// ─── Indicator and provider implementations ──────────────────────────

/// A catalog indicator instance bound to a slot kind.
pub struct BuiltinIndicator {
    blueprint: &'static Blueprint,
    kind: SlotKind,
    params: ParamSet,
    components: Vec<IndicatorComponent>,
}

impl Indicator for BuiltinIndicator {
    fn name(&self) -> &str {
        self.blueprint.name
    }

    fn supported_kinds(&self) -> &[SlotKind] {
        self.blueprint.kinds
    }

    fn is_generatable(&self) -> bool {
        self.blueprint.generatable
    }

    fn supports_exit_filters(&self) -> bool {
        self.blueprint.supports_exit_filters
    }

    fn intraday_only(&self) -> bool {
        self.blueprint.intraday_only
    }

    fn initialize(&mut self, kind: SlotKind) {
        self.kind = kind;
        self.params = (self.blueprint.params_for)(kind);
        self.components.clear();
    }

    fn kind(&self) -> SlotKind {
        self.kind
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn calculate(&mut self, dataset: &Dataset) -> Result<(), CalculationFault> {
        self.components = (self.blueprint.compute)(&self.params, self.kind, dataset).map_err(
            |message| CalculationFault {
                indicator: self.blueprint.name.to_string(),
                kind: self.kind,
                message,
            },
        )?;
        Ok(())
    }

    fn components(&self) -> &[IndicatorComponent] {
        &self.components
    }

    fn chart_meta(&self) -> ChartMeta {
        (self.blueprint.chart)(&self.params)
    }
}

/// The built-in reference catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalog;

impl IndicatorProvider for BuiltinCatalog {
    fn names(&self) -> Vec<String> {
        CATALOG.iter().map(|b| b.name.to_string()).collect()
    }

    fn construct(&self, name: &str) -> Result<Box<dyn Indicator>, UnknownIndicator> {
        let blueprint = CATALOG
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| UnknownIndicator(name.to_string()))?;
        let mut indicator = BuiltinIndicator {
            blueprint,
            kind: blueprint.kinds[0],
            params: ParamSet::default(),
            components: Vec::new(),
        };
        indicator.initialize(blueprint.kinds[0]);
        Ok(Box::new(indicator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_dataset;

    fn trending_dataset() -> Dataset {
        // 120 bars: slow decline then strong rally, enough for every
        // default lookback in the catalog.
        let closes: Vec<f64> = (0..120)
            .map(|i| {
                if i < 60 {
                    100.0 - i as f64 * 0.1
                } else {
                    94.0 + (i - 60) as f64 * 0.3
                }
            })
            .collect();
        make_dataset(&closes)
    }

    #[test]
    fn every_catalog_indicator_calculates_for_every_supported_kind() {
        let catalog = BuiltinCatalog;
        let dataset = trending_dataset();
        for name in catalog.names() {
            let mut indicator = catalog.construct(&name).unwrap();
            let kinds = indicator.supported_kinds().to_vec();
            for kind in kinds {
                indicator.initialize(kind);
                indicator
                    .calculate(&dataset)
                    .unwrap_or_else(|e| panic!("{name} failed on {kind:?}: {e}"));
                assert!(
                    !indicator.components().is_empty(),
                    "{name} produced no components"
                );
                assert!(
                    indicator.first_valid_bar() < dataset.bar_count(),
                    "{name} never becomes valid on {kind:?}"
                );
            }
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!(BuiltinCatalog.construct("Astrology").is_err());
    }

    #[test]
    fn empty_dataset_faults() {
        let mut indicator = BuiltinCatalog.construct("MA Crossover").unwrap();
        let empty = Dataset::new("EMPTY", crate::domain::Granularity::Hour, vec![]);
        let fault = indicator.calculate(&empty).unwrap_err();
        assert_eq!(fault.indicator, "MA Crossover");
    }

    #[test]
    fn ma_crossover_signals_both_directions() {
        let mut indicator = BuiltinCatalog.construct("MA Crossover").unwrap();
        indicator.initialize(SlotKind::EntrySignal);
        indicator.params_mut().num[0].value = 3.0; // fast
        indicator.params_mut().num[1].value = 10.0; // slow
        indicator.calculate(&trending_dataset()).unwrap();
        let signal = &indicator.components()[0].values;
        assert!(signal.contains(&1.0), "expected a long entry");
        assert!(signal.contains(&-1.0), "expected a short entry");
    }

    #[test]
    fn bar_closing_fires_every_bar() {
        let mut indicator = BuiltinCatalog.construct("Bar Closing").unwrap();
        indicator.initialize(SlotKind::ExitSignal);
        indicator.calculate(&trending_dataset()).unwrap();
        assert!(indicator.components()[0].values.iter().all(|&v| v == 1.0));
        assert_eq!(indicator.first_valid_bar(), 0);
    }

    #[test]
    fn close_and_reverse_never_fires_on_its_own() {
        let mut indicator = BuiltinCatalog.construct("Close and Reverse").unwrap();
        indicator.initialize(SlotKind::ExitSignal);
        indicator.calculate(&trending_dataset()).unwrap();
        assert!(indicator.components()[0].values.iter().all(|&v| v == 0.0));
        assert!(indicator.supports_exit_filters());
    }

    #[test]
    fn entry_time_is_intraday_only() {
        let indicator = BuiltinCatalog.construct("Entry Time").unwrap();
        assert!(indicator.intraday_only());
    }

    #[test]
    fn level_logic_items_mention_level() {
        let params = rsi_params(SlotKind::EntryFilter);
        let logic = &params.list[0];
        assert!(!logic.items[0].contains("Level"));
        assert!(!logic.items[1].contains("Level"));
        assert!(logic.items[2].contains("Level"));
        assert!(logic.items[3].contains("Level"));
    }

    #[test]
    fn rsi_level_logic_respects_level() {
        let mut indicator = BuiltinCatalog.construct("RSI").unwrap();
        indicator.initialize(SlotKind::EntryFilter);
        indicator.params_mut().list[0].index = 2; // higher than the Level line
        indicator.params_mut().num[1].value = 50.0;
        let rising: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        indicator.calculate(&make_dataset(&rising)).unwrap();
        let action = &indicator.components()[0].values;
        let first = indicator.first_valid_bar();
        assert!(action[first..].iter().all(|&v| v == 1.0));
    }

    #[test]
    fn moving_average_shift_extends_warmup() {
        let mut indicator = BuiltinCatalog.construct("Moving Average").unwrap();
        indicator.initialize(SlotKind::ExitFilter);
        indicator.params_mut().num[0].value = 10.0;
        indicator.params_mut().num[1].value = 5.0;
        indicator.calculate(&trending_dataset()).unwrap();
        assert_eq!(indicator.components()[0].first_valid_bar, 15);
    }

    #[test]
    fn exit_filter_support_matches_catalog() {
        let with = ["Moving Average", "Bar Closing", "Close and Reverse"];
        for name in BuiltinCatalog.names() {
            let indicator = BuiltinCatalog.construct(&name).unwrap();
            assert_eq!(
                indicator.supports_exit_filters(),
                with.contains(&name.as_str()),
                "{name}"
            );
        }
    }
}
