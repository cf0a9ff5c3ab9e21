use super::comparator::{ComparatorError, FieldComparator, FieldComparisonResult, normalize_path};
use super::manifest::{ScenarioManifest, select_scenarios, validate_scenario_names};
use super::solver::{ProcessSolver, SolverError, SolverRunner};
use crate::domain::{
    DEFAULT_CLEANUP_DIR, DEFAULT_SOLVER_EXECUTABLE, FailureMode, RegressError, RunResult,
    Scenario, default_sgh_scenarios,
};
use crate::numerics::{PercentTolerance, format_percent};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct RegressionRunnerConfig {
    pub executable: PathBuf,
    pub manifest_path: Option<PathBuf>,
    pub working_dir: PathBuf,
    pub cleanup_dir: PathBuf,
    pub threshold: Option<f64>,
    pub failure_mode: FailureMode,
    pub scenario_patterns: Vec<String>,
    pub report_path: Option<PathBuf>,
}

impl Default for RegressionRunnerConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_SOLVER_EXECUTABLE),
            manifest_path: None,
            working_dir: PathBuf::from("."),
            cleanup_dir: PathBuf::from(DEFAULT_CLEANUP_DIR),
            threshold: None,
            failure_mode: FailureMode::FailFast,
            scenario_patterns: Vec::new(),
            report_path: None,
        }
    }
}

impl RegressionRunnerConfig {
    pub fn tolerance(&self) -> PercentTolerance {
        self.threshold
            .map(PercentTolerance::new)
            .unwrap_or_default()
    }

    fn cleanup_root(&self) -> PathBuf {
        self.working_dir.join(&self.cleanup_dir)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioPhase {
    Pending,
    Running,
    Comparing,
    Passed,
    Failed,
    CleanedUp,
}

impl Display for ScenarioPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Comparing => "comparing",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::CleanedUp => "cleaned-up",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CleanupOutcome {
    Removed,
    NotPresent,
    Failed { message: String },
}

impl CleanupOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegressionRunReport {
    pub generated_at_unix_seconds: u64,
    pub passed: bool,
    pub solver: String,
    pub working_dir: String,
    pub cleanup_dir: String,
    pub threshold: f64,
    pub failure_mode: FailureMode,
    pub scenario_count: usize,
    pub passed_scenario_count: usize,
    pub failed_scenario_count: usize,
    pub skipped_scenarios: Vec<String>,
    pub scenarios: Vec<ScenarioReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub passed: bool,
    pub input_deck: String,
    pub reference_path: String,
    pub output_path: String,
    pub failure: Option<String>,
    pub fields: Vec<FieldComparisonResult>,
    pub cleanup: CleanupOutcome,
}

impl RegressionRunReport {
    pub fn first_failure(&self) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|scenario| !scenario.passed)
    }

    /// Turns a failing report into a `ToleranceViolation` naming the first
    /// failing scenario.
    pub fn ensure_passed(&self) -> RunResult<()> {
        match self.first_failure() {
            None => Ok(()),
            Some(scenario) => Err(RegressError::tolerance_violation(
                "REGRESSION.TOLERANCE",
                format!(
                    "scenario '{}' failed: {}",
                    scenario.name,
                    scenario
                        .failure
                        .as_deref()
                        .unwrap_or("comparison failed without a reason")
                ),
            )),
        }
    }
}

/// Resolves scenarios and the solver from `config`, then runs them.
pub fn run_regression(config: &RegressionRunnerConfig) -> RunResult<RegressionRunReport> {
    let solver =
        ProcessSolver::locate(&config.executable, &config.working_dir).map_err(RegressError::from)?;

    let (scenarios, manifest_threshold) = match &config.manifest_path {
        Some(manifest_path) => {
            let manifest = ScenarioManifest::from_path(manifest_path).map_err(RegressError::from)?;
            (manifest.scenarios(), manifest.threshold)
        }
        None => (default_sgh_scenarios(), None),
    };
    let scenarios =
        select_scenarios(scenarios, &config.scenario_patterns).map_err(RegressError::from)?;

    let effective = RegressionRunnerConfig {
        threshold: config.threshold.or(manifest_threshold),
        ..config.clone()
    };
    run_scenarios(&scenarios, &effective, &solver)
}

/// Runs `scenarios` strictly in order against `solver`.
///
/// Harness errors (solver, read, shape) abort the run after the scenario's
/// cleanup. Tolerance failures stop the run under `FailFast` and are
/// accumulated under `CollectAll`.
pub fn run_scenarios(
    scenarios: &[Scenario],
    config: &RegressionRunnerConfig,
    solver: &dyn SolverRunner,
) -> RunResult<RegressionRunReport> {
    preflight(scenarios, config).map_err(RegressError::from)?;

    let tolerance = config.tolerance();
    let comparator = FieldComparator::new(tolerance);
    let cleanup_root = config.cleanup_root();

    tracing::info!(
        solver = %solver.describe(),
        scenarios = scenarios.len(),
        threshold = tolerance.threshold,
        "starting regression run"
    );

    let mut scenario_reports = Vec::with_capacity(scenarios.len());
    let mut skipped_scenarios = Vec::new();
    for (position, scenario) in scenarios.iter().enumerate() {
        log_phase(&scenario.name, ScenarioPhase::Pending);
        let outcome = execute_scenario(scenario, config, solver, &comparator);
        let cleanup = clean_output_tree(&scenario.name, &cleanup_root);
        let fields = outcome.map_err(|error| {
            tracing::error!(scenario = %scenario.name, %error, "scenario aborted");
            RegressError::from(error)
        })?;

        let report = scenario_report(scenario, fields, cleanup);
        let passed = report.passed;
        scenario_reports.push(report);

        if !passed && config.failure_mode == FailureMode::FailFast {
            skipped_scenarios.extend(
                scenarios[position + 1..]
                    .iter()
                    .map(|remaining| remaining.name.clone()),
            );
            break;
        }
    }

    if !skipped_scenarios.is_empty() {
        tracing::warn!(
            skipped = skipped_scenarios.len(),
            "fail-fast stop; remaining scenarios skipped"
        );
    }

    let scenario_count = scenario_reports.len();
    let passed_scenario_count = scenario_reports
        .iter()
        .filter(|scenario| scenario.passed)
        .count();
    let failed_scenario_count = scenario_count.saturating_sub(passed_scenario_count);

    let report = RegressionRunReport {
        generated_at_unix_seconds: current_unix_timestamp_seconds(),
        passed: failed_scenario_count == 0,
        solver: solver.describe(),
        working_dir: normalize_path(&config.working_dir),
        cleanup_dir: normalize_path(&config.cleanup_dir),
        threshold: tolerance.threshold,
        failure_mode: config.failure_mode,
        scenario_count,
        passed_scenario_count,
        failed_scenario_count,
        skipped_scenarios,
        scenarios: scenario_reports,
    };

    if let Some(report_path) = &config.report_path {
        write_report_file(report_path, &report).map_err(RegressError::from)?;
    }
    Ok(report)
}

pub fn render_human_summary(report: &RegressionRunReport) -> String {
    let mut lines = Vec::new();
    let status = if report.passed { "PASS" } else { "FAIL" };
    lines.push(format!("Regression status: {}", status));
    lines.push(format!(
        "Scenarios: {} run ({} passed, {} failed, {} skipped)",
        report.scenario_count,
        report.passed_scenario_count,
        report.failed_scenario_count,
        report.skipped_scenarios.len()
    ));
    lines.push(format!(
        "Threshold: {}% ({})",
        format_percent(report.threshold),
        report.solver
    ));

    for scenario in &report.scenarios {
        let scenario_status = if scenario.passed { "PASS" } else { "FAIL" };
        let max_abs = scenario
            .fields
            .iter()
            .map(|field| field.verdict.max_abs_percent_difference)
            .fold(0.0_f64, f64::max);
        lines.push(format!(
            "Scenario {}: {} ({} field(s), max_abs_diff={}%)",
            scenario.name,
            scenario_status,
            scenario.fields.len(),
            format_percent(max_abs)
        ));

        if let Some(failure) = &scenario.failure {
            lines.push(format!("  first failure: {}", failure));
        }
        if let CleanupOutcome::Failed { message } = &scenario.cleanup {
            lines.push(format!("  cleanup failed: {}", message));
        }
    }

    if !report.skipped_scenarios.is_empty() {
        lines.push(format!(
            "Skipped after failure: {}",
            report.skipped_scenarios.join(", ")
        ));
    }

    lines.join("\n")
}

#[derive(Debug, thiserror::Error)]
pub enum RegressionRunnerError {
    #[error("invalid threshold {0}: expected a positive finite percent")]
    InvalidThreshold(f64),
    #[error("invalid scenario set: {0}")]
    InvalidScenarios(String),
    #[error(
        "scenario '{scenario}': reference '{}' lies inside cleanup directory '{}' and would be deleted",
        reference.display(),
        cleanup_dir.display()
    )]
    ReferenceInCleanupDir {
        scenario: String,
        reference: PathBuf,
        cleanup_dir: PathBuf,
    },
    #[error(
        "scenario '{scenario}': output '{}' must lie inside cleanup directory '{}' so it is removed after the run",
        output.display(),
        cleanup_dir.display()
    )]
    OutputOutsideCleanupDir {
        scenario: String,
        output: PathBuf,
        cleanup_dir: PathBuf,
    },
    #[error("failed to resolve working directory '{}': {source}", path.display())]
    WorkingDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error("scenario '{scenario}': {source}")]
    Comparator {
        scenario: String,
        source: ComparatorError,
    },
    #[error("failed to create report directory '{}': {source}", path.display())]
    ReportDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize report '{}': {source}", path.display())]
    SerializeReport {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write report '{}': {source}", path.display())]
    WriteReport {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<RegressionRunnerError> for RegressError {
    fn from(error: RegressionRunnerError) -> Self {
        let message = error.to_string();
        match error {
            RegressionRunnerError::InvalidThreshold(_) => {
                RegressError::input_validation("INPUT.THRESHOLD", message)
            }
            RegressionRunnerError::InvalidScenarios(_) => {
                RegressError::input_validation("INPUT.SCENARIO_NAMES", message)
            }
            RegressionRunnerError::ReferenceInCleanupDir { .. } => {
                RegressError::input_validation("INPUT.REFERENCE_ALIASING", message)
            }
            RegressionRunnerError::OutputOutsideCleanupDir { .. } => {
                RegressError::input_validation("INPUT.OUTPUT_OUTSIDE_CLEANUP", message)
            }
            RegressionRunnerError::WorkingDir { .. } => {
                RegressError::io_system("IO.WORKING_DIR", message)
            }
            RegressionRunnerError::Solver(source) => source.into(),
            RegressionRunnerError::Comparator { source, .. } => {
                let inner = RegressError::from(source);
                RegressError::new(inner.category(), inner.placeholder(), message)
            }
            RegressionRunnerError::ReportDirectory { .. }
            | RegressionRunnerError::WriteReport { .. } => {
                RegressError::io_system("IO.REGRESSION_REPORT", message)
            }
            RegressionRunnerError::SerializeReport { .. } => {
                RegressError::internal("SYS.REGRESSION_REPORT", message)
            }
        }
    }
}

fn preflight(
    scenarios: &[Scenario],
    config: &RegressionRunnerConfig,
) -> Result<(), RegressionRunnerError> {
    if let Some(threshold) = config.threshold {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(RegressionRunnerError::InvalidThreshold(threshold));
        }
    }

    validate_scenario_names(scenarios.iter().map(|scenario| scenario.name.as_str()))
        .map_err(RegressionRunnerError::InvalidScenarios)?;

    for scenario in scenarios {
        for field in &scenario.fields {
            field.validate().map_err(|message| {
                RegressionRunnerError::InvalidScenarios(format!(
                    "scenario '{}': {}",
                    scenario.name, message
                ))
            })?;
        }
    }

    // Absolute paths in scenarios must compare against an absolute root.
    let working_dir = std::path::absolute(&config.working_dir).map_err(|source| {
        RegressionRunnerError::WorkingDir {
            path: config.working_dir.clone(),
            source,
        }
    })?;
    let cleanup_root = lexical_normalize(&working_dir.join(&config.cleanup_dir));
    for scenario in scenarios {
        let reference = lexical_normalize(&working_dir.join(&scenario.reference_path));
        if reference.starts_with(&cleanup_root) {
            return Err(RegressionRunnerError::ReferenceInCleanupDir {
                scenario: scenario.name.clone(),
                reference: scenario.reference_path.clone(),
                cleanup_dir: config.cleanup_dir.clone(),
            });
        }

        let output = lexical_normalize(&working_dir.join(&scenario.output_path));
        if output == cleanup_root || !output.starts_with(&cleanup_root) {
            return Err(RegressionRunnerError::OutputOutsideCleanupDir {
                scenario: scenario.name.clone(),
                output: scenario.output_path.clone(),
                cleanup_dir: config.cleanup_dir.clone(),
            });
        }
    }

    Ok(())
}

fn execute_scenario(
    scenario: &Scenario,
    config: &RegressionRunnerConfig,
    solver: &dyn SolverRunner,
    comparator: &FieldComparator,
) -> Result<Vec<FieldComparisonResult>, RegressionRunnerError> {
    log_phase(&scenario.name, ScenarioPhase::Running);
    solver.run(&scenario.input_deck, &config.working_dir)?;

    log_phase(&scenario.name, ScenarioPhase::Comparing);
    let reference = config.working_dir.join(&scenario.reference_path);
    let candidate = config.working_dir.join(&scenario.output_path);
    comparator
        .compare_fields(&scenario.fields, &reference, &candidate)
        .map_err(|source| RegressionRunnerError::Comparator {
            scenario: scenario.name.clone(),
            source,
        })
}

fn scenario_report(
    scenario: &Scenario,
    fields: Vec<FieldComparisonResult>,
    cleanup: CleanupOutcome,
) -> ScenarioReport {
    let failure = fields.iter().find(|field| !field.passed).map(|field| {
        format!(
            "{} ({}): {}",
            field.keyword,
            field.kind,
            field
                .reason
                .as_deref()
                .unwrap_or("comparison failed without a reason")
        )
    });
    let passed = failure.is_none();

    if let Some(failure) = &failure {
        log_phase(&scenario.name, ScenarioPhase::Failed);
        tracing::error!(scenario = %scenario.name, %failure, "scenario failed");
    } else {
        log_phase(&scenario.name, ScenarioPhase::Passed);
    }

    ScenarioReport {
        name: scenario.name.clone(),
        passed,
        input_deck: normalize_path(&scenario.input_deck),
        reference_path: normalize_path(&scenario.reference_path),
        output_path: normalize_path(&scenario.output_path),
        failure,
        fields,
        cleanup,
    }
}

fn clean_output_tree(scenario: &str, cleanup_root: &Path) -> CleanupOutcome {
    let outcome = match fs::symlink_metadata(cleanup_root) {
        Err(error) if error.kind() == ErrorKind::NotFound => CleanupOutcome::NotPresent,
        Err(error) => CleanupOutcome::Failed {
            message: format!("failed to inspect '{}': {}", cleanup_root.display(), error),
        },
        Ok(metadata) if !metadata.is_dir() => CleanupOutcome::Failed {
            message: format!(
                "'{}' is not a directory; symbolic links are not followed",
                cleanup_root.display()
            ),
        },
        Ok(_) => match fs::remove_dir_all(cleanup_root) {
            Ok(()) => CleanupOutcome::Removed,
            Err(error) => CleanupOutcome::Failed {
                message: format!("failed to remove '{}': {}", cleanup_root.display(), error),
            },
        },
    };

    match &outcome {
        CleanupOutcome::Failed { message } => {
            tracing::warn!(%scenario, %message, "output cleanup failed");
        }
        _ => log_phase(scenario, ScenarioPhase::CleanedUp),
    }
    outcome
}

fn log_phase(scenario: &str, phase: ScenarioPhase) {
    tracing::info!(%scenario, %phase, "scenario phase");
}

/// Resolves `.` and `..` without touching the filesystem; the output tree
/// usually does not exist yet during pre-flight.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                } else {
                    normalized.push(component.as_os_str());
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn write_report_file(
    report_path: &Path,
    report: &RegressionRunReport,
) -> Result<(), RegressionRunnerError> {
    if let Some(parent_dir) = report_path.parent() {
        fs::create_dir_all(parent_dir).map_err(|source| {
            RegressionRunnerError::ReportDirectory {
                path: parent_dir.to_path_buf(),
                source,
            }
        })?;
    }

    let report_json = serde_json::to_string_pretty(report).map_err(|source| {
        RegressionRunnerError::SerializeReport {
            path: report_path.to_path_buf(),
            source,
        }
    })?;
    fs::write(report_path, report_json).map_err(|source| RegressionRunnerError::WriteReport {
        path: report_path.to_path_buf(),
        source,
    })
}

fn current_unix_timestamp_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}
