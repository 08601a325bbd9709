//! Best-result tracker — the authoritative best configuration plus a
//! bounded nomination list and a human-readable description log.
//!
//! Promotion deep-copies the candidate (slot statuses included) so later
//! mutation of the working configuration cannot corrupt the stored best.
//! Strict improvements append a log entry; tie-promotions update the most
//! recent entry in place.

use serde::{Deserialize, Serialize};

use rulelab_core::Configuration;

use crate::scoring::Score;

/// Two scores within this distance tie.
pub const SCORE_EPSILON: f64 = 1e-6;

/// An immutable snapshot of a scored configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessRecord {
    pub score: f64,
    pub label: String,
    pub config: Configuration,
}

/// Outcome of offering a candidate to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    /// Strictly improved the best score.
    Improved,
    /// Tied the best score and was accepted (equal-result flag, or fewer
    /// slots than the current best).
    TieAccepted,
    /// Qualified for the nomination list without replacing the best.
    Nominated,
    Rejected,
}

#[derive(Debug, Clone)]
pub struct BestTracker {
    best: Option<FitnessRecord>,
    best_score: f64,
    nominations: Vec<FitnessRecord>,
    capacity: usize,
    history: Vec<String>,
}

impl BestTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            best: None,
            best_score: f64::NEG_INFINITY,
            nominations: Vec::new(),
            capacity,
            history: Vec::new(),
        }
    }

    /// Fresh-search reset: drop all records and seed the score floor.
    pub fn reset(&mut self, floor: f64) {
        self.best = None;
        self.best_score = floor;
        self.nominations.clear();
        self.history.clear();
    }

    pub fn best(&self) -> Option<&FitnessRecord> {
        self.best.as_ref()
    }

    pub fn best_score(&self) -> f64 {
        self.best_score
    }

    pub fn nominations(&self) -> &[FitnessRecord] {
        &self.nominations
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_none() && self.nominations.is_empty()
    }

    /// Nomination test: distinct score (no duplicate within epsilon) that
    /// fits the bounded list — free capacity, or better than the worst.
    pub fn is_nominated(&self, score: f64) -> bool {
        if score.is_nan() {
            return false;
        }
        if self
            .nominations
            .iter()
            .any(|r| (r.score - score).abs() < SCORE_EPSILON)
        {
            return false;
        }
        if self.nominations.len() < self.capacity {
            return self.capacity > 0;
        }
        self.nominations
            .last()
            .map(|worst| score > worst.score)
            .unwrap_or(false)
    }

    /// Offer a scored candidate.
    pub fn consider(
        &mut self,
        score: Score,
        config: &Configuration,
        accept_equal: bool,
    ) -> Promotion {
        if score.value.is_nan() {
            return Promotion::Rejected;
        }

        let best_slots = self
            .best
            .as_ref()
            .map(|r| r.config.slot_count())
            .unwrap_or(usize::MAX);
        let record = || FitnessRecord {
            score: score.value,
            label: score.label.clone(),
            config: config.clone(),
        };

        // Within-epsilon ties are resolved before strict improvement, so
        // the outcome does not depend on which candidate arrived first. A
        // tie needs an existing best to compare against; the fresh-run
        // floor is not a result.
        let tie = self.best.is_some() && (score.value - self.best_score).abs() < SCORE_EPSILON;
        if tie {
            if accept_equal || config.slot_count() < best_slots {
                let record = record();
                let description = describe(&record);
                match self.history.last_mut() {
                    Some(last) => *last = description,
                    None => self.history.push(description),
                }
                self.nominate(record.clone());
                self.best = Some(record);
                self.best_score = score.value;
                return Promotion::TieAccepted;
            }
        } else if score.value > self.best_score {
            let record = record();
            let description = describe(&record);
            self.history.push(description);
            self.nominate(record.clone());
            self.best = Some(record);
            self.best_score = score.value;
            return Promotion::Improved;
        }

        if self.is_nominated(score.value) {
            self.nominate(record());
            return Promotion::Nominated;
        }

        Promotion::Rejected
    }

    fn nominate(&mut self, record: FitnessRecord) {
        if self.capacity == 0 {
            return;
        }
        if self
            .nominations
            .iter()
            .any(|r| (r.score - record.score).abs() < SCORE_EPSILON)
        {
            return;
        }
        self.nominations.push(record);
        self.nominations.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        self.nominations.truncate(self.capacity);
    }
}

/// Human-readable one-line description of a record.
fn describe(record: &FitnessRecord) -> String {
    let config = &record.config;
    let entry = &config.slots[config.entry_slot()].indicator;
    let exit = &config.slots[config.exit_slot()].indicator;
    format!(
        "{} {:.4} | {} slots | {} ({} filters) -> {} ({} filters)",
        record.label,
        record.score,
        config.slot_count(),
        entry,
        config.entry_filter_count(),
        exit,
        config.exit_filter_count(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(value: f64) -> Score {
        Score {
            value,
            label: "Net Balance".into(),
        }
    }

    fn config_with_slots(entry_filters: usize) -> Configuration {
        let mut config = Configuration::new(entry_filters, 0);
        config.slots[0].indicator = "MA Crossover".into();
        let exit = config.exit_slot();
        config.slots[exit].indicator = "Bar Closing".into();
        config
    }

    #[test]
    fn strict_improvement_promotes_and_appends_history() {
        let mut tracker = BestTracker::new(10);
        tracker.reset(0.0);

        assert_eq!(
            tracker.consider(score(100.0), &config_with_slots(0), false),
            Promotion::Improved
        );
        assert_eq!(
            tracker.consider(score(200.0), &config_with_slots(1), false),
            Promotion::Improved
        );
        assert_eq!(tracker.history().len(), 2);
        assert_eq!(tracker.best_score(), 200.0);
    }

    #[test]
    fn best_score_is_non_decreasing() {
        let mut tracker = BestTracker::new(10);
        tracker.reset(0.0);
        let mut last = tracker.best_score();
        for value in [50.0, 10.0, 80.0, 79.0, 200.0, 1.0] {
            tracker.consider(score(value), &config_with_slots(0), false);
            assert!(tracker.best_score() >= last);
            last = tracker.best_score();
        }
    }

    #[test]
    fn tie_with_fewer_slots_promotes() {
        let mut tracker = BestTracker::new(10);
        tracker.reset(0.0);
        tracker.consider(score(100.0), &config_with_slots(2), false);

        let outcome = tracker.consider(
            score(100.0 + SCORE_EPSILON / 2.0),
            &config_with_slots(0),
            false,
        );
        assert_eq!(outcome, Promotion::TieAccepted);
        assert_eq!(tracker.best().unwrap().config.slot_count(), 2);
    }

    #[test]
    fn tie_with_more_slots_is_not_promoted() {
        let mut tracker = BestTracker::new(0);
        tracker.reset(0.0);
        tracker.consider(score(100.0), &config_with_slots(0), false);

        let outcome = tracker.consider(score(100.0), &config_with_slots(2), false);
        assert_eq!(outcome, Promotion::Rejected);
    }

    #[test]
    fn tie_accepted_with_equal_result_flag() {
        let mut tracker = BestTracker::new(10);
        tracker.reset(0.0);
        tracker.consider(score(100.0), &config_with_slots(0), false);

        let outcome = tracker.consider(score(100.0), &config_with_slots(2), true);
        assert_eq!(outcome, Promotion::TieAccepted);
    }

    #[test]
    fn tie_updates_history_in_place() {
        let mut tracker = BestTracker::new(10);
        tracker.reset(0.0);
        tracker.consider(score(100.0), &config_with_slots(2), false);
        assert_eq!(tracker.history().len(), 1);

        tracker.consider(score(100.0), &config_with_slots(0), false);
        assert_eq!(tracker.history().len(), 1);
        assert!(tracker.history()[0].contains("2 slots"));
    }

    #[test]
    fn promotion_deep_copies_the_candidate() {
        let mut tracker = BestTracker::new(10);
        tracker.reset(0.0);
        let mut config = config_with_slots(0);
        tracker.consider(score(100.0), &config, false);

        config.slots[0].indicator = "Mutated".into();
        assert_eq!(
            tracker.best().unwrap().config.slots[0].indicator,
            "MA Crossover"
        );
    }

    #[test]
    fn nominations_dedup_by_score() {
        let mut tracker = BestTracker::new(10);
        tracker.reset(0.0);
        tracker.consider(score(100.0), &config_with_slots(0), false);

        // Lower score, same as an existing nomination: rejected.
        tracker.consider(score(50.0), &config_with_slots(0), false);
        assert_eq!(
            tracker.consider(score(50.0), &config_with_slots(1), false),
            Promotion::Rejected
        );
        assert_eq!(tracker.nominations().len(), 2);
    }

    #[test]
    fn nominations_are_bounded_and_sorted() {
        let mut tracker = BestTracker::new(3);
        tracker.reset(0.0);
        for value in [10.0, 40.0, 20.0, 30.0, 50.0] {
            tracker.consider(score(value), &config_with_slots(0), false);
        }
        let scores: Vec<f64> = tracker.nominations().iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![50.0, 40.0, 30.0]);
    }

    #[test]
    fn score_below_floor_never_becomes_best() {
        let mut tracker = BestTracker::new(10);
        tracker.reset(0.0);
        // May still be nominated, but the best slot stays empty.
        assert_eq!(
            tracker.consider(score(-5.0), &config_with_slots(0), false),
            Promotion::Nominated
        );
        assert!(tracker.best().is_none());
        assert_eq!(tracker.best_score(), 0.0);
    }

    #[test]
    fn nan_scores_are_rejected() {
        let mut tracker = BestTracker::new(10);
        tracker.reset(0.0);
        assert_eq!(
            tracker.consider(score(f64::NAN), &config_with_slots(0), false),
            Promotion::Rejected
        );
    }
}
