//! Parameter randomizer — assigns values to one slot's enabled parameters
//! and guarantees the indicator is computable early enough in the history.
//!
//! Domain rules preserved from the source catalog:
//! - A "Base price" choice never resolves to High or Low.
//! - A numeric parameter implying a lookback period or shift is clamped so
//!   its maximum does not exceed one third of the available bar count.
//! - A "Level" parameter is skipped while the leading list choice does not
//!   name a level-based mode (see DESIGN.md — fragile, kept verbatim).

use rand::Rng;
use tracing::debug;

use rulelab_core::indicators::Indicator;
use rulelab_core::params::NumericParam;
use rulelab_core::{Dataset, SlotSpec};

use crate::error::CycleFault;

/// An indicator whose earliest valid bar falls inside this tail of the
/// history is unusable for that draw.
pub const WARMUP_TAIL_BARS: usize = 10;

/// Bound on the redraw-and-recompute loop.
pub const MAX_WARMUP_RETRIES: usize = 32;

/// Randomize the slot's parameters on the given indicator instance,
/// calculate it, and populate the slot with the resolved component data.
///
/// The indicator must already be constructed and initialized for the
/// slot's kind; its parameter set is the randomization target.
pub fn randomize_slot<R: Rng>(
    slot: &mut SlotSpec,
    indicator: &mut dyn Indicator,
    dataset: &Dataset,
    rng: &mut R,
    use_default_values: bool,
) -> Result<(), CycleFault> {
    randomize_list_params(indicator, rng);

    let bars = dataset.bar_count();
    for attempt in 0..MAX_WARMUP_RETRIES {
        if !use_default_values {
            randomize_numeric_params(indicator, bars, rng);
        }

        indicator.calculate(dataset).map_err(CycleFault::from)?;

        let first_valid = indicator.first_valid_bar();
        if first_valid + WARMUP_TAIL_BARS <= bars {
            slot.indicator = indicator.name().to_string();
            slot.params = indicator.params().clone();
            slot.components = indicator.components().to_vec();
            slot.chart = indicator.chart_meta();
            slot.is_defined = true;
            return Ok(());
        }

        debug!(
            indicator = indicator.name(),
            attempt,
            first_valid,
            bars,
            "indicator warms up too late, redrawing parameters"
        );
        // Default values never change between attempts.
        if use_default_values {
            break;
        }
    }

    Err(CycleFault::WarmupExhausted {
        indicator: indicator.name().to_string(),
    })
}

/// Pick a random choice for every enabled list parameter. The "Base price"
/// rule filters High/Low out of the candidate set.
fn randomize_list_params<R: Rng>(indicator: &mut dyn Indicator, rng: &mut R) {
    for param in &mut indicator.params_mut().list {
        if !param.enabled || param.items.is_empty() {
            continue;
        }
        let candidates: Vec<usize> = (0..param.items.len())
            .filter(|&i| {
                param.caption != "Base price"
                    || (param.items[i] != "High" && param.items[i] != "Low")
            })
            .collect();
        param.index = if candidates.is_empty() {
            rng.gen_range(0..param.items.len())
        } else {
            candidates[rng.gen_range(0..candidates.len())]
        };
    }
}

fn randomize_numeric_params<R: Rng>(indicator: &mut dyn Indicator, bars: usize, rng: &mut R) {
    let leading_choice = indicator
        .params()
        .list
        .first()
        .map(|p| p.text().to_string())
        .unwrap_or_default();

    for param in &mut indicator.params_mut().num {
        if !param.enabled {
            continue;
        }
        if level_rule_applies(param, &leading_choice) {
            continue;
        }

        let step = param.step();
        let minimum = param.min;
        let mut maximum = param.max;
        if maximum > bars as f64 / 3.0 && implies_lookback(param) {
            maximum = (bars as f64 / 3.0).max(minimum + step);
        }

        let steps = ((maximum - minimum) / step) as u64;
        let value = minimum + step * rng.gen_range(0..steps.max(1)) as f64;
        param.value = param.round_to_precision(value);
    }
}

/// The "Level" skip rule: a parameter captioned "Level" keeps its prior
/// value while the leading list choice does not mention "Level".
fn level_rule_applies(param: &NumericParam, leading_choice: &str) -> bool {
    param.caption == "Level" && !leading_choice.contains("Level")
}

/// Whether a numeric parameter describes a lookback period or shift.
fn implies_lookback(param: &NumericParam) -> bool {
    let caption = param.caption.to_lowercase();
    caption.contains("period")
        || caption.contains("shift")
        || param.tooltip.to_lowercase().contains("period")
}
