pub mod errors;

pub use errors::{ExitProfile, RegressError, RegressErrorCategory, RegressResult, RunResult};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type Vec3 = [f64; 3];

pub const POSITION_KEYWORD: &str = "POINTS";
pub const LOOKUP_TABLE_MARKER: &str = "LOOKUP_TABLE";
pub const DEFAULT_PERCENT_THRESHOLD: f64 = 1.0e-6;

pub const DEFAULT_SOLVER_EXECUTABLE: &str = "../../build-fierro-openmp/bin/fierro-parallel-explicit";
pub const DEFAULT_OUTPUT_RELATIVE_PATH: &str = "vtk/data/VTK0.vtk";
pub const DEFAULT_CLEANUP_DIR: &str = "vtk";
pub const DEFAULT_SGH_SCENARIOS: [&str; 3] = ["Noh", "Sedov", "Sod"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Vector,
    Scalar,
}

impl FieldKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vector => "vector",
            Self::Scalar => "scalar",
        }
    }
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FieldCheck {
    pub keyword: String,
    #[serde(default)]
    pub kind: FieldKind,
}

impl FieldCheck {
    pub fn new(keyword: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            keyword: keyword.into(),
            kind,
        }
    }

    pub fn vector(keyword: impl Into<String>) -> Self {
        Self::new(keyword, FieldKind::Vector)
    }

    pub fn scalar(keyword: impl Into<String>) -> Self {
        Self::new(keyword, FieldKind::Scalar)
    }

    /// Node positions, the field every scenario checks unless told otherwise.
    pub fn positions() -> Self {
        Self::vector(POSITION_KEYWORD)
    }

    /// A blank keyword matches the first line of any file, so the reader would
    /// start collecting inside the header.
    pub fn validate(&self) -> Result<(), String> {
        if self.keyword.trim().is_empty() {
            return Err(format!("{} field keyword must not be blank", self.kind));
        }
        Ok(())
    }
}

/// Series read from one dataset section.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSeries {
    Vector(Vec<Vec3>),
    Scalar(Vec<f64>),
}

impl FieldSeries {
    pub fn len(&self) -> usize {
        match self {
            Self::Vector(values) => values.len(),
            Self::Scalar(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Vector(_) => FieldKind::Vector,
            Self::Scalar(_) => FieldKind::Scalar,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    #[default]
    FailFast,
    CollectAll,
}

/// One regression case: run the solver on `input_deck`, then diff the file
/// it writes at `output_path` against `reference_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub name: String,
    pub input_deck: PathBuf,
    pub reference_path: PathBuf,
    pub output_path: PathBuf,
    pub fields: Vec<FieldCheck>,
}

impl Scenario {
    pub fn new(
        name: impl Into<String>,
        input_deck: impl Into<PathBuf>,
        reference_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            input_deck: input_deck.into(),
            reference_path: reference_path.into(),
            output_path: output_path.into(),
            fields: vec![FieldCheck::positions()],
        }
    }

    /// Scenario laid out the way the SGH test inputs and standard results are
    /// stored next to the solver sources.
    pub fn sgh(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            name.clone(),
            sgh_input_deck(&name),
            sgh_reference_result(&name),
            DEFAULT_OUTPUT_RELATIVE_PATH,
        )
    }

    pub fn with_fields(mut self, fields: Vec<FieldCheck>) -> Self {
        self.fields = fields;
        self
    }
}

pub fn sgh_input_deck(name: &str) -> PathBuf {
    PathBuf::from(format!("Solver-Inputs/SGH_{}_simple.yaml", name))
}

pub fn sgh_reference_result(name: &str) -> PathBuf {
    PathBuf::from(format!("standard-results/SGH/{}/vtk/data/VTK0.vtk", name))
}

pub fn default_sgh_scenarios() -> Vec<Scenario> {
    DEFAULT_SGH_SCENARIOS
        .iter()
        .map(|name| Scenario::sgh(*name))
        .collect()
}
