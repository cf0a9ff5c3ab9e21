pub mod comparator;
pub mod manifest;
pub mod regression;
pub mod solver;

pub use comparator::{ComparatorError, FieldComparator, FieldComparisonResult};
pub use manifest::{ManifestError, ManifestScenario, ScenarioManifest, select_scenarios};
pub use regression::{
    CleanupOutcome, RegressionRunReport, RegressionRunnerConfig, RegressionRunnerError,
    ScenarioPhase, ScenarioReport, render_human_summary, run_regression, run_scenarios,
};
pub use solver::{ProcessSolver, SolverError, SolverRunner};
