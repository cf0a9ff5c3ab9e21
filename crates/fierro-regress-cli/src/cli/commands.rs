use super::CliError;
use super::helpers::*;
use anyhow::Context;
use fierro_regress_core::comparator::{FieldComparator, FieldComparisonResult};
use fierro_regress_core::domain::{
    DEFAULT_CLEANUP_DIR, DEFAULT_SOLVER_EXECUTABLE, FailureMode, FieldCheck, FieldKind,
    POSITION_KEYWORD, RegressError,
};
use fierro_regress_core::numerics::format_percent;
use fierro_regress_core::regression::{
    RegressionRunnerConfig, render_human_summary, run_regression,
};
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct RunArgs {
    /// Solver executable, relative paths resolve against the working directory
    #[arg(long, default_value = DEFAULT_SOLVER_EXECUTABLE)]
    executable: PathBuf,

    /// Scenario manifest (JSON); defaults to the built-in SGH suite
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Directory the solver runs in and scenario paths are relative to
    #[arg(long, default_value = ".")]
    working_dir: PathBuf,

    /// Solver output tree removed after every scenario
    #[arg(long, default_value = DEFAULT_CLEANUP_DIR)]
    cleanup_dir: PathBuf,

    /// Failing percent difference; overrides the manifest threshold
    #[arg(long)]
    threshold: Option<f64>,

    /// Keep running scenarios after a tolerance failure
    #[arg(long)]
    keep_going: bool,

    /// Only run scenarios whose name matches GLOB (repeatable)
    #[arg(long = "scenario", value_name = "GLOB")]
    scenarios: Vec<String>,

    /// JSON report output path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print the JSON report to stdout instead of the summary
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn into_config(self) -> RegressionRunnerConfig {
        RegressionRunnerConfig {
            executable: self.executable,
            manifest_path: self.manifest,
            working_dir: self.working_dir,
            cleanup_dir: self.cleanup_dir,
            threshold: self.threshold,
            failure_mode: if self.keep_going {
                FailureMode::CollectAll
            } else {
                FailureMode::FailFast
            },
            scenario_patterns: self.scenarios,
            report_path: self.report,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub(super) enum KindArg {
    Vector,
    Scalar,
}

impl From<KindArg> for FieldKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Vector => FieldKind::Vector,
            KindArg::Scalar => FieldKind::Scalar,
        }
    }
}

#[derive(clap::Args)]
pub(super) struct CompareArgs {
    /// Reference results file
    #[arg(long)]
    reference: PathBuf,

    /// Candidate results file
    #[arg(long)]
    candidate: PathBuf,

    /// Section keyword to compare
    #[arg(long, default_value = POSITION_KEYWORD)]
    keyword: String,

    /// Shape of each section line
    #[arg(long, value_enum, default_value_t = KindArg::Vector)]
    kind: KindArg,

    /// Failing percent difference
    #[arg(long)]
    threshold: Option<f64>,
}

pub(super) fn run_regression_command(args: RunArgs) -> Result<i32, CliError> {
    let print_json = args.json;
    let invocation_dir = current_working_dir()?;
    let config = resolve_regression_paths(args.into_config(), &invocation_dir);
    tracing::debug!(
        working_dir = %config.working_dir.display(),
        executable = %config.executable.display(),
        "resolved regression configuration"
    );

    let report = run_regression(&config)?;
    if print_json {
        let report_json =
            serde_json::to_string_pretty(&report).context("failed to render JSON report")?;
        println!("{}", report_json);
    } else {
        println!("{}", render_human_summary(&report));
        if let Some(report_path) = &config.report_path {
            println!("JSON report: {}", report_path.display());
        }
    }

    if report.passed { Ok(0) } else { Ok(1) }
}

pub(super) fn run_compare_command(args: CompareArgs) -> Result<i32, CliError> {
    let tolerance = tolerance_from_flag(args.threshold)?;
    let check = FieldCheck::new(args.keyword, args.kind.into());
    check
        .validate()
        .map_err(|message| RegressError::input_validation("INPUT.FIELD_KEYWORD", message))?;

    let result = FieldComparator::new(tolerance)
        .compare_field(&check, &args.reference, &args.candidate)
        .map_err(|error| CliError::Compute(error.into()))?;
    println!("{}", render_comparison(&result, tolerance.threshold));

    if result.passed { Ok(0) } else { Ok(1) }
}

fn render_comparison(result: &FieldComparisonResult, threshold: f64) -> String {
    let status = if result.passed { "PASS" } else { "FAIL" };
    let mut lines = vec![
        format!("Comparison status: {}", status),
        format!(
            "Field {} ({}): {} element(s), max_abs_diff={}%, threshold={}%",
            result.keyword,
            result.kind,
            result.element_count,
            format_percent(result.verdict.max_abs_percent_difference),
            format_percent(threshold)
        ),
    ];
    if let Some(reason) = &result.reason {
        lines.push(format!("  first failure: {}", reason));
    }
    lines.join("\n")
}
