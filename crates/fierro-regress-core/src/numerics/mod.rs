pub mod difference;
pub mod tolerance;

pub use difference::{
    DifferenceError, VECTOR_ARITY, magnitude, percent_difference, percent_difference_scalars,
    percent_difference_vectors,
};
pub use tolerance::{ElementFailure, PercentTolerance, ToleranceVerdict};

use crate::domain::FieldSeries;

/// Percent-difference series for two series of the same field kind.
pub fn percent_difference_series(
    reference: &FieldSeries,
    candidate: &FieldSeries,
) -> Result<Vec<f64>, DifferenceError> {
    match (reference, candidate) {
        (FieldSeries::Vector(reference), FieldSeries::Vector(candidate)) => {
            percent_difference_vectors(reference, candidate)
        }
        (FieldSeries::Scalar(reference), FieldSeries::Scalar(candidate)) => {
            percent_difference_scalars(reference, candidate)
        }
        (reference, candidate) => Err(DifferenceError::ShapeMismatch {
            index: 0,
            reference_arity: element_arity(reference),
            candidate_arity: element_arity(candidate),
        }),
    }
}

fn element_arity(series: &FieldSeries) -> usize {
    match series {
        FieldSeries::Vector(_) => VECTOR_ARITY,
        FieldSeries::Scalar(_) => 1,
    }
}

/// Formats a percent value compactly for summaries and failure messages.
pub fn format_percent(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value == f64::INFINITY {
        return "inf".to_string();
    }
    if value == f64::NEG_INFINITY {
        return "-inf".to_string();
    }
    format!("{:.6e}", value)
}
