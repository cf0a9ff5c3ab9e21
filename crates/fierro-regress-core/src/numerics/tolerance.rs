use crate::domain::DEFAULT_PERCENT_THRESHOLD;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PercentTolerance {
    /// An element fails once `|percent difference| >= threshold`.
    pub threshold: f64,
}

impl Default for PercentTolerance {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_PERCENT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElementFailure {
    pub index: usize,
    pub percent_difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToleranceVerdict {
    pub passed: bool,
    pub compared_values: usize,
    pub failing_values: usize,
    pub max_abs_percent_difference: f64,
    pub first_failure: Option<ElementFailure>,
}

impl PercentTolerance {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Non-finite differences always fail; they only arise from a non-finite
    /// candidate and would otherwise slip past the `>=` comparison.
    pub fn exceeds(&self, percent_difference: f64) -> bool {
        !percent_difference.is_finite() || percent_difference.abs() >= self.threshold
    }

    pub fn evaluate(&self, differences: &[f64]) -> ToleranceVerdict {
        let mut failing_values = 0usize;
        let mut max_abs_percent_difference = 0.0_f64;
        let mut first_failure = None;

        for (index, difference) in differences.iter().copied().enumerate() {
            if difference.is_finite() {
                max_abs_percent_difference = max_abs_percent_difference.max(difference.abs());
            }
            if self.exceeds(difference) {
                failing_values += 1;
                first_failure.get_or_insert(ElementFailure {
                    index,
                    percent_difference: difference,
                });
            }
        }

        ToleranceVerdict {
            passed: failing_values == 0,
            compared_values: differences.len(),
            failing_values,
            max_abs_percent_difference,
            first_failure,
        }
    }
}
