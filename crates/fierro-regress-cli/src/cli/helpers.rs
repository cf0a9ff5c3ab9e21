use fierro_regress_core::domain::{RegressError, RegressResult};
use fierro_regress_core::numerics::PercentTolerance;
use fierro_regress_core::regression::RegressionRunnerConfig;
use std::path::{Path, PathBuf};

pub(super) fn current_working_dir() -> RegressResult<PathBuf> {
    std::env::current_dir().map_err(|source| {
        RegressError::io_system(
            "IO.CLI_CURRENT_DIR",
            format!("failed to read current working directory: {}", source),
        )
    })
}

/// Anchors the paths a user types on the command line to the invocation
/// directory. The solver executable and scenario paths stay relative to the
/// scenario working directory.
pub(super) fn resolve_regression_paths(
    mut config: RegressionRunnerConfig,
    invocation_dir: &Path,
) -> RegressionRunnerConfig {
    config.working_dir = resolve_cli_path(invocation_dir, &config.working_dir);
    config.manifest_path = config
        .manifest_path
        .map(|path| resolve_cli_path(invocation_dir, &path));
    config.report_path = config
        .report_path
        .map(|path| resolve_cli_path(invocation_dir, &path));
    config
}

pub(super) fn resolve_cli_path(working_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    }
}

pub(super) fn tolerance_from_flag(threshold: Option<f64>) -> RegressResult<PercentTolerance> {
    match threshold {
        None => Ok(PercentTolerance::default()),
        Some(value) if value.is_finite() && value > 0.0 => Ok(PercentTolerance::new(value)),
        Some(value) => Err(RegressError::input_validation(
            "INPUT.THRESHOLD",
            format!("--threshold must be a positive finite percent, got {}", value),
        )),
    }
}
