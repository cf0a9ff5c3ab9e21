use crate::domain::RegressError;

pub const VECTOR_ARITY: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DifferenceError {
    #[error("series length mismatch (reference={reference_len}, candidate={candidate_len})")]
    LengthMismatch {
        reference_len: usize,
        candidate_len: usize,
    },
    #[error(
        "vector element {index} must have 3 components (reference={reference_arity}, candidate={candidate_arity})"
    )]
    ShapeMismatch {
        index: usize,
        reference_arity: usize,
        candidate_arity: usize,
    },
}

impl From<DifferenceError> for RegressError {
    fn from(error: DifferenceError) -> Self {
        let message = error.to_string();
        match error {
            DifferenceError::LengthMismatch { .. } => RegressError::shape("SHAPE.LENGTH", message),
            DifferenceError::ShapeMismatch { .. } => RegressError::shape("SHAPE.ARITY", message),
        }
    }
}

/// Signed percent change from `reference` to `candidate`; a zero reference
/// counts as no change.
pub fn percent_difference(reference: f64, candidate: f64) -> f64 {
    if reference != 0.0 {
        (candidate - reference) / reference * 100.0
    } else {
        0.0
    }
}

pub fn percent_difference_scalars(
    reference: &[f64],
    candidate: &[f64],
) -> Result<Vec<f64>, DifferenceError> {
    ensure_same_length(reference.len(), candidate.len())?;
    Ok(reference
        .iter()
        .zip(candidate)
        .map(|(reference, candidate)| percent_difference(*reference, *candidate))
        .collect())
}

/// Per-element magnitude of the component-wise percent differences.
pub fn percent_difference_vectors<R, C>(
    reference: &[R],
    candidate: &[C],
) -> Result<Vec<f64>, DifferenceError>
where
    R: AsRef<[f64]>,
    C: AsRef<[f64]>,
{
    ensure_same_length(reference.len(), candidate.len())?;

    let mut magnitudes = Vec::with_capacity(reference.len());
    for (index, (reference, candidate)) in reference.iter().zip(candidate).enumerate() {
        let (reference, candidate) = (reference.as_ref(), candidate.as_ref());
        if reference.len() != VECTOR_ARITY || candidate.len() != VECTOR_ARITY {
            return Err(DifferenceError::ShapeMismatch {
                index,
                reference_arity: reference.len(),
                candidate_arity: candidate.len(),
            });
        }

        let mut components = [0.0_f64; VECTOR_ARITY];
        for (component, (reference, candidate)) in
            components.iter_mut().zip(reference.iter().zip(candidate))
        {
            *component = percent_difference(*reference, *candidate);
        }
        magnitudes.push(magnitude(&components));
    }

    Ok(magnitudes)
}

pub fn magnitude(values: &[f64]) -> f64 {
    values.iter().map(|value| value * value).sum::<f64>().sqrt()
}

fn ensure_same_length(reference_len: usize, candidate_len: usize) -> Result<(), DifferenceError> {
    if reference_len == candidate_len {
        Ok(())
    } else {
        Err(DifferenceError::LengthMismatch {
            reference_len,
            candidate_len,
        })
    }
}
