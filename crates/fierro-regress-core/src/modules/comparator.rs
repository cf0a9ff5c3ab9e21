use crate::domain::{FieldCheck, FieldKind, RegressError};
use crate::numerics::{
    DifferenceError, PercentTolerance, ToleranceVerdict, format_percent, percent_difference_series,
};
use crate::vtk::{VtkReadError, read_field};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Compares fields between a reference results file and a candidate one.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldComparator {
    tolerance: PercentTolerance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldComparisonResult {
    pub keyword: String,
    pub kind: FieldKind,
    pub reference_path: String,
    pub candidate_path: String,
    pub element_count: usize,
    pub passed: bool,
    pub reason: Option<String>,
    pub verdict: ToleranceVerdict,
}

impl FieldComparator {
    pub fn new(tolerance: PercentTolerance) -> Self {
        Self { tolerance }
    }

    pub fn compare_field(
        &self,
        check: &FieldCheck,
        reference_path: impl AsRef<Path>,
        candidate_path: impl AsRef<Path>,
    ) -> Result<FieldComparisonResult, ComparatorError> {
        let reference_path = reference_path.as_ref();
        let candidate_path = candidate_path.as_ref();

        let reference = read_field(reference_path, check)?;
        let candidate = read_field(candidate_path, check)?;
        let differences = percent_difference_series(&reference, &candidate).map_err(|source| {
            ComparatorError::Difference {
                keyword: check.keyword.clone(),
                reference: reference_path.to_path_buf(),
                candidate: candidate_path.to_path_buf(),
                source,
            }
        })?;

        if differences.is_empty() {
            tracing::warn!(
                keyword = %check.keyword,
                reference = %reference_path.display(),
                "section is empty or missing in both files; nothing to compare"
            );
        }

        let verdict = self.tolerance.evaluate(&differences);
        let reason = verdict.first_failure.map(|failure| {
            format!(
                "{} of {} element(s) at or above {}%; first at element {} ({}%)",
                verdict.failing_values,
                verdict.compared_values,
                format_percent(self.tolerance.threshold),
                failure.index,
                format_percent(failure.percent_difference)
            )
        });

        tracing::debug!(
            keyword = %check.keyword,
            elements = differences.len(),
            failing = verdict.failing_values,
            max_abs_percent = verdict.max_abs_percent_difference,
            "field compared"
        );

        Ok(FieldComparisonResult {
            keyword: check.keyword.clone(),
            kind: check.kind,
            reference_path: normalize_path(reference_path),
            candidate_path: normalize_path(candidate_path),
            element_count: differences.len(),
            passed: verdict.passed,
            reason,
            verdict,
        })
    }

    pub fn compare_fields(
        &self,
        checks: &[FieldCheck],
        reference_path: &Path,
        candidate_path: &Path,
    ) -> Result<Vec<FieldComparisonResult>, ComparatorError> {
        checks
            .iter()
            .map(|check| self.compare_field(check, reference_path, candidate_path))
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ComparatorError {
    #[error(transparent)]
    Read(#[from] VtkReadError),
    #[error("field '{keyword}' in '{}' vs '{}': {source}", reference.display(), candidate.display())]
    Difference {
        keyword: String,
        reference: PathBuf,
        candidate: PathBuf,
        source: DifferenceError,
    },
}

impl From<ComparatorError> for RegressError {
    fn from(error: ComparatorError) -> Self {
        let message = error.to_string();
        match error {
            ComparatorError::Read(source) => source.into(),
            ComparatorError::Difference {
                source: DifferenceError::LengthMismatch { .. },
                ..
            } => RegressError::shape("SHAPE.LENGTH", message),
            ComparatorError::Difference {
                source: DifferenceError::ShapeMismatch { .. },
                ..
            } => RegressError::shape("SHAPE.ARITY", message),
        }
    }
}

pub(crate) fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
