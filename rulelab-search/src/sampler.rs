//! Configuration-space sampler — builds one complete, structurally valid
//! candidate per cycle.
//!
//! Locked slots are copied verbatim, linked slots keep their indicator and
//! re-randomize parameters, open slots draw a fresh indicator name from
//! the eligible list minus the blacklist. Scalar properties (signal
//! actions, protection, martingale) are randomized afterwards unless
//! locked or individually preserved.

use rand::Rng;

use rulelab_core::indicators::{CalculationFault, Indicator, IndicatorProvider};
use rulelab_core::{
    Configuration, Dataset, OppositeDirAction, SameDirAction, SlotKind, SlotSpec, SlotStatus,
    StrategyProperties,
};

use crate::blacklist::IndicatorBlacklist;
use crate::config::{MoneySettings, SearchConfig};
use crate::eligibility::EligibleIndicators;
use crate::error::CycleFault;
use crate::randomizer;

/// Locked/linked slots carried over from the template configuration.
#[derive(Debug, Clone, Default)]
pub struct CarryOver {
    pub entry_signal: Option<SlotSpec>,
    pub entry_filters: Vec<SlotSpec>,
    pub exit_signal: Option<SlotSpec>,
    pub exit_filters: Vec<SlotSpec>,
}

impl CarryOver {
    /// Snapshot every locked or linked slot of the template.
    pub fn snapshot(template: &Configuration) -> Self {
        let mut carry = Self::default();
        for slot in &template.slots {
            if !matches!(slot.status, SlotStatus::Locked | SlotStatus::Linked) {
                continue;
            }
            match slot.kind {
                SlotKind::EntrySignal => carry.entry_signal = Some(slot.clone()),
                SlotKind::EntryFilter => carry.entry_filters.push(slot.clone()),
                SlotKind::ExitSignal => carry.exit_signal = Some(slot.clone()),
                SlotKind::ExitFilter => carry.exit_filters.push(slot.clone()),
            }
        }
        carry
    }

    fn linked_slots(&self, entry: bool) -> impl Iterator<Item = &SlotSpec> {
        let (signal, filters) = if entry {
            (&self.entry_signal, &self.entry_filters)
        } else {
            (&self.exit_signal, &self.exit_filters)
        };
        signal
            .iter()
            .chain(filters.iter())
            .filter(|s| s.status == SlotStatus::Linked)
    }
}

/// Lock analysis for one run: which sides are frozen, and the effective
/// filter maxima (raised to the locked counts where necessary).
#[derive(Debug, Clone, Copy)]
pub struct Locks {
    pub entry_locked: bool,
    pub exit_locked: bool,
    pub max_entry_filters: usize,
    pub max_exit_filters: usize,
}

/// Determine whether the entry and exit sides are fully locked.
///
/// A side counts as locked when its signal slot is carried over and no
/// further filter slot can be added; a linked carried slot with
/// randomizable parameters re-opens the side.
pub fn detect_locks(
    carry: &CarryOver,
    eligible: &EligibleIndicators,
    max_entry_filters: usize,
    max_exit_filters: usize,
) -> Locks {
    let mut entry_locked =
        carry.entry_signal.is_some() && carry.entry_filters.len() >= max_entry_filters;
    let max_entry_filters = max_entry_filters.max(carry.entry_filters.len());

    let mut exit_locked = match &carry.exit_signal {
        Some(slot) if !eligible.supports_exit_filters(&slot.indicator) => true,
        Some(_) => carry.exit_filters.len() >= max_exit_filters,
        None => {
            !carry.exit_filters.is_empty() && carry.exit_filters.len() >= max_exit_filters
        }
    };
    let max_exit_filters = max_exit_filters.max(carry.exit_filters.len());

    if entry_locked
        && carry
            .linked_slots(true)
            .any(|s| s.params.has_randomizable())
    {
        entry_locked = false;
    }
    if exit_locked
        && carry
            .linked_slots(false)
            .any(|s| s.params.has_randomizable())
    {
        exit_locked = false;
    }

    Locks {
        entry_locked,
        exit_locked,
        max_entry_filters,
        max_exit_filters,
    }
}

/// Builds one candidate configuration per call.
pub struct ConfigSampler<'a> {
    pub provider: &'a dyn IndicatorProvider,
    pub eligible: &'a EligibleIndicators,
    pub carry: &'a CarryOver,
    pub locks: Locks,
    pub template_props: &'a StrategyProperties,
    pub search: &'a SearchConfig,
    pub dataset: &'a Dataset,
}

impl ConfigSampler<'_> {
    /// Produce a complete candidate. `calculations` counts indicator
    /// computations for the benchmark.
    pub fn sample<R: Rng>(
        &self,
        blacklist: &IndicatorBlacklist,
        rng: &mut R,
        calculations: &mut u64,
    ) -> Result<Configuration, CycleFault> {
        let locked_entry_filters = self.carry.entry_filters.len();
        let locked_exit_filters = self.carry.exit_filters.len();

        let entry_filters =
            rng.gen_range(locked_entry_filters..=self.locks.max_entry_filters);

        // Exit filters are possible only when the exit signal (locked or
        // to-be-drawn) supports them.
        let filters_allowed = match &self.carry.exit_signal {
            Some(slot) => self.eligible.supports_exit_filters(&slot.indicator),
            None => !self.eligible.exit_signals_with_filters.is_empty(),
        };
        if !filters_allowed && locked_exit_filters > 0 {
            return Err(CycleFault::SpaceExhaustion {
                kind: SlotKind::ExitFilter,
            });
        }
        let exit_filters = if filters_allowed && self.locks.max_exit_filters > 0 {
            rng.gen_range(locked_exit_filters..=self.locks.max_exit_filters)
        } else {
            0
        };

        let mut config = Configuration::new(entry_filters, exit_filters);
        config.props = self.base_properties();

        // Entry signal.
        self.fill_slot(
            &mut config,
            0,
            self.carry.entry_signal.as_ref(),
            false,
            blacklist,
            rng,
            calculations,
        )?;

        // Entry filters: locked carry-overs first, then random draws.
        for i in 0..entry_filters {
            let carried = self.carry.entry_filters.get(i);
            self.fill_slot(&mut config, 1 + i, carried, false, blacklist, rng, calculations)?;
        }

        // Exit signal: draw from the with-filters list when filters follow.
        let exit_index = config.exit_slot();
        self.fill_slot(
            &mut config,
            exit_index,
            self.carry.exit_signal.as_ref(),
            exit_filters > 0,
            blacklist,
            rng,
            calculations,
        )?;

        // Exit filters.
        for i in 0..exit_filters {
            let carried = self.carry.exit_filters.get(i);
            self.fill_slot(
                &mut config,
                exit_index + 1 + i,
                carried,
                false,
                blacklist,
                rng,
                calculations,
            )?;
        }

        self.randomize_properties(&mut config, rng);
        Ok(config)
    }

    /// Template properties with the money-management lot default applied.
    fn base_properties(&self) -> StrategyProperties {
        let mut props = self.template_props.clone();
        let money = &self.search.money;
        if money.default_lot > 0.0 {
            props.entry_lots = money.default_lot;
            props.adding_lots = money.default_lot;
            props.reducing_lots = money.default_lot;
        }
        props
    }

    #[allow(clippy::too_many_arguments)]
    fn fill_slot<R: Rng>(
        &self,
        config: &mut Configuration,
        index: usize,
        carried: Option<&SlotSpec>,
        exit_with_filters: bool,
        blacklist: &IndicatorBlacklist,
        rng: &mut R,
        calculations: &mut u64,
    ) -> Result<(), CycleFault> {
        let kind = config.slots[index].kind;
        match carried {
            Some(original) => {
                let mut slot = original.clone();
                slot.index = index;
                if slot.status == SlotStatus::Linked {
                    self.randomize_slot(&mut slot, rng, calculations)?;
                    slot.status = SlotStatus::Linked;
                }
                config.slots[index] = slot;
            }
            None => {
                let mut slot = SlotSpec::new(index, kind);
                slot.indicator = self.eligible.draw(kind, exit_with_filters, blacklist, rng)?;
                self.randomize_slot(&mut slot, rng, calculations)?;
                config.slots[index] = slot;
            }
        }
        Ok(())
    }

    fn randomize_slot<R: Rng>(
        &self,
        slot: &mut SlotSpec,
        rng: &mut R,
        calculations: &mut u64,
    ) -> Result<(), CycleFault> {
        let mut indicator =
            self.provider
                .construct(&slot.indicator)
                .map_err(|e| CalculationFault {
                    indicator: slot.indicator.clone(),
                    kind: slot.kind,
                    message: e.to_string(),
                })?;
        indicator.initialize(slot.kind);
        *calculations += 1;
        randomizer::randomize_slot(
            slot,
            indicator.as_mut(),
            self.dataset,
            rng,
            self.search.use_default_param_values,
        )
    }

    /// Randomize the scalar properties, honoring the lock status and the
    /// per-property preserve flags.
    fn randomize_properties<R: Rng>(&self, config: &mut Configuration, rng: &mut R) {
        let best = self.template_props;
        let money: &MoneySettings = &self.search.money;
        let multiplier = if money.five_digit_quotes { 50.0 } else { 5.0 };

        if best.status == SlotStatus::Locked {
            return;
        }

        // Same-direction and opposite-direction signal actions.
        if money.single_order {
            config.props.same_signal_action = SameDirAction::Nothing;
        } else if !self.search.preserve_same_dir_action {
            config.props.same_signal_action =
                SameDirAction::ALL[rng.gen_range(0..SameDirAction::ALL.len())];
        }
        if !self.search.preserve_opp_dir_action {
            config.props.opp_signal_action =
                OppositeDirAction::ALL[rng.gen_range(0..OppositeDirAction::ALL.len())];
        }
        if config.exit_indicator() == "Close and Reverse" {
            config.props.opp_signal_action = OppositeDirAction::Reverse;
        }

        // Permanent stop-loss.
        if !self.search.preserve_permanent_sl {
            let use_sl = rng.gen_range(0..100) > 30;
            let change_sl = rng.gen_range(0..100) > 50;
            config.props.use_permanent_sl = use_sl;
            config.props.permanent_sl_type = rulelab_core::ProtectionType::Relative;
            if use_sl && change_sl {
                config.props.permanent_sl = multiplier * rng.gen_range(5..50) as f64;
            }
        }

        // Permanent take-profit.
        if !self.search.preserve_permanent_tp {
            let use_tp = rng.gen_range(0..100) > 30;
            let change_tp = rng.gen_range(0..100) > 50;
            config.props.use_permanent_tp = use_tp;
            config.props.permanent_tp_type = rulelab_core::ProtectionType::Relative;
            if use_tp && change_tp {
                config.props.permanent_tp = multiplier * rng.gen_range(5..50) as f64;
            }
        }

        // Break-even.
        if !self.search.preserve_break_even {
            let use_be = rng.gen_range(0..100) > 30;
            let change_be = rng.gen_range(0..100) > 50;
            config.props.use_break_even = use_be;
            if use_be && change_be {
                config.props.break_even = multiplier * rng.gen_range(5..50) as f64;
            }
        }

        // Martingale stays off unless the properties are locked.
        config.props.use_martingale = false;
        config.props.martingale_multiplier = 2.0;
    }
}
