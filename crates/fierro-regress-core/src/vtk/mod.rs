//! Read path for the legacy VTK text format written by the solver.
//!
//! Only keyword-delimited sections are understood: a section starts after the
//! first line containing the keyword and runs until the next blank line.
//! A keyword that never appears yields an empty series.

mod parser;

pub use parser::VtkReadError;

use crate::domain::{FieldCheck, FieldKind, FieldSeries, RegressError, Vec3};
use parser::{STREAM_ORIGIN, open, scan_section};
use std::io::BufRead;
use std::path::Path;

pub fn read_vector(path: impl AsRef<Path>, keyword: &str) -> Result<Vec<Vec3>, VtkReadError> {
    let path = path.as_ref();
    collect_vectors(open(path)?, path, keyword)
}

pub fn read_scalar(path: impl AsRef<Path>, keyword: &str) -> Result<Vec<f64>, VtkReadError> {
    let path = path.as_ref();
    collect_scalars(open(path)?, path, keyword)
}

pub fn read_vector_from<R: BufRead>(reader: R, keyword: &str) -> Result<Vec<Vec3>, VtkReadError> {
    collect_vectors(reader, Path::new(STREAM_ORIGIN), keyword)
}

pub fn read_scalar_from<R: BufRead>(reader: R, keyword: &str) -> Result<Vec<f64>, VtkReadError> {
    collect_scalars(reader, Path::new(STREAM_ORIGIN), keyword)
}

pub fn read_field(path: impl AsRef<Path>, check: &FieldCheck) -> Result<FieldSeries, VtkReadError> {
    match check.kind {
        FieldKind::Vector => read_vector(path, &check.keyword).map(FieldSeries::Vector),
        FieldKind::Scalar => read_scalar(path, &check.keyword).map(FieldSeries::Scalar),
    }
}

fn collect_vectors<R: BufRead>(
    reader: R,
    origin: &Path,
    keyword: &str,
) -> Result<Vec<Vec3>, VtkReadError> {
    let mut values = Vec::new();
    scan_section(reader, origin, keyword, |line| {
        values.push(line.vector()?);
        Ok(())
    })?;
    Ok(values)
}

fn collect_scalars<R: BufRead>(
    reader: R,
    origin: &Path,
    keyword: &str,
) -> Result<Vec<f64>, VtkReadError> {
    let mut values = Vec::new();
    scan_section(reader, origin, keyword, |line| {
        if !line.is_lookup_table() {
            values.push(line.scalar()?);
        }
        Ok(())
    })?;
    Ok(values)
}

impl From<VtkReadError> for RegressError {
    fn from(error: VtkReadError) -> Self {
        let message = error.to_string();
        match error {
            VtkReadError::Open { .. } | VtkReadError::Read { .. } => {
                RegressError::io_system("IO.VTK_READ", message)
            }
            VtkReadError::Encoding { .. } => RegressError::parse("PARSE.VTK_ENCODING", message),
            VtkReadError::InvalidNumber { .. } => RegressError::parse("PARSE.VTK_TOKEN", message),
            VtkReadError::FieldCount { .. } => {
                RegressError::parse("PARSE.VTK_FIELD_COUNT", message)
            }
        }
    }
}
