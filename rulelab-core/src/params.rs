//! Parameter domains for indicator slots.
//!
//! A list parameter is an ordered set of textual choices with a current
//! index; a numeric parameter is a closed interval with a decimal-precision
//! step. Only enabled parameters are subject to randomization.

use serde::{Deserialize, Serialize};

/// A list-valued parameter: ordered choices, one selected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParam {
    pub caption: String,
    pub items: Vec<String>,
    pub index: usize,
    pub enabled: bool,
}

impl ListParam {
    pub fn new(caption: impl Into<String>, items: &[&str], index: usize) -> Self {
        Self {
            caption: caption.into(),
            items: items.iter().map(|s| s.to_string()).collect(),
            index,
            enabled: true,
        }
    }

    /// Text of the currently selected choice.
    pub fn text(&self) -> &str {
        self.items
            .get(self.index)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// A numeric parameter on a step grid.
///
/// `point` is the decimal precision; the step is `10^-point`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericParam {
    pub caption: String,
    pub tooltip: String,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub point: u32,
    pub enabled: bool,
}

impl NumericParam {
    pub fn new(
        caption: impl Into<String>,
        tooltip: impl Into<String>,
        value: f64,
        min: f64,
        max: f64,
        point: u32,
    ) -> Self {
        Self {
            caption: caption.into(),
            tooltip: tooltip.into(),
            value,
            min,
            max,
            point,
            enabled: true,
        }
    }

    /// Grid step implied by the decimal precision.
    pub fn step(&self) -> f64 {
        10f64.powi(-(self.point as i32))
    }

    /// Round a raw value to this parameter's precision.
    pub fn round_to_precision(&self, value: f64) -> f64 {
        let factor = 10f64.powi(self.point as i32);
        (value * factor).round() / factor
    }
}

/// The ordered parameter set of one slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParamSet {
    pub list: Vec<ListParam>,
    pub num: Vec<NumericParam>,
}

impl ParamSet {
    /// True if randomization can change anything: an enabled list parameter
    /// with more than one choice, or any enabled numeric parameter.
    pub fn has_randomizable(&self) -> bool {
        self.list.iter().any(|p| p.enabled && p.items.len() > 1)
            || self.num.iter().any(|p| p.enabled)
    }

    /// Selected text of the list parameter with the given caption.
    pub fn list_text(&self, caption: &str) -> Option<&str> {
        self.list
            .iter()
            .find(|p| p.caption == caption)
            .map(|p| p.text())
    }

    /// Value of the numeric parameter with the given caption.
    pub fn num_value(&self, caption: &str) -> Option<f64> {
        self.num
            .iter()
            .find(|p| p.caption == caption)
            .map(|p| p.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period_param() -> NumericParam {
        NumericParam::new("Period", "lookback period of the indicator", 14.0, 5.0, 50.0, 0)
    }

    #[test]
    fn list_param_text() {
        let p = ListParam::new("Base price", &["Open", "High", "Low", "Close"], 3);
        assert_eq!(p.text(), "Close");
    }

    #[test]
    fn list_param_out_of_range_index_is_empty() {
        let mut p = ListParam::new("Base price", &["Open"], 0);
        p.index = 7;
        assert_eq!(p.text(), "");
    }

    #[test]
    fn numeric_step_from_precision() {
        assert_eq!(period_param().step(), 1.0);
        let fine = NumericParam::new("Level", "", 30.0, 0.0, 100.0, 2);
        assert!((fine.step() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn round_to_precision() {
        let p = NumericParam::new("Level", "", 0.0, 0.0, 100.0, 2);
        assert_eq!(p.round_to_precision(1.23456), 1.23);
        assert_eq!(period_param().round_to_precision(13.7), 14.0);
    }

    #[test]
    fn empty_set_has_nothing_randomizable() {
        assert!(!ParamSet::default().has_randomizable());
    }

    #[test]
    fn single_item_list_is_not_randomizable() {
        let set = ParamSet {
            list: vec![ListParam::new("Logic", &["Only choice"], 0)],
            num: vec![],
        };
        assert!(!set.has_randomizable());
    }

    #[test]
    fn enabled_numeric_is_randomizable() {
        let set = ParamSet {
            list: vec![],
            num: vec![period_param()],
        };
        assert!(set.has_randomizable());
    }

    #[test]
    fn disabled_numeric_is_not_randomizable() {
        let mut p = period_param();
        p.enabled = false;
        let set = ParamSet {
            list: vec![],
            num: vec![p],
        };
        assert!(!set.has_randomizable());
    }

    #[test]
    fn lookup_by_caption() {
        let set = ParamSet {
            list: vec![ListParam::new("Base price", &["Open", "Close"], 1)],
            num: vec![period_param()],
        };
        assert_eq!(set.list_text("Base price"), Some("Close"));
        assert_eq!(set.num_value("Period"), Some(14.0));
        assert_eq!(set.num_value("Shift"), None);
    }
}
