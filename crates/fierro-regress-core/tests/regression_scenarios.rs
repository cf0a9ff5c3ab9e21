use fierro_regress_core::domain::RegressErrorCategory;
use fierro_regress_core::regression::{RegressionRunnerConfig, run_regression};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const REFERENCE: &str = "\
# vtk DataFile Version 2.0
Mesh for Fierro
ASCII
DATASET UNSTRUCTURED_GRID
POINTS 2 float
0 0 0
1 0 0

CELLS 0 0
";

#[test]
fn missing_executable_aborts_before_any_scenario() {
    let temp = TempDir::new().expect("tempdir should be created");
    write_file(&temp.path().join("vtk/data/VTK0.vtk"), REFERENCE);
    let config = RegressionRunnerConfig {
        working_dir: temp.path().to_path_buf(),
        ..RegressionRunnerConfig::default()
    };

    let error = run_regression(&config).expect_err("missing solver should fail pre-flight");

    assert_eq!(error.category(), RegressErrorCategory::EnvironmentError);
    assert_eq!(error.exit_code(), 4);
    assert!(
        error.message().contains("fierro-parallel-explicit"),
        "{}",
        error.message()
    );
    assert!(temp.path().join("vtk/data/VTK0.vtk").is_file());
}

#[test]
fn manifest_filter_without_match_is_an_input_error() {
    let temp = TempDir::new().expect("tempdir should be created");
    let solver = write_file(&temp.path().join("bin/solver"), "");
    let manifest = write_file(
        &temp.path().join("scenarios.json"),
        r#"{ "scenarios": [{ "name": "Noh" }, { "name": "Sod" }] }"#,
    );
    let config = RegressionRunnerConfig {
        executable: solver,
        manifest_path: Some(manifest),
        working_dir: temp.path().to_path_buf(),
        scenario_patterns: vec!["Taylor*".to_string()],
        ..RegressionRunnerConfig::default()
    };

    let error = run_regression(&config).expect_err("filter should fail");
    assert_eq!(error.category(), RegressErrorCategory::InputValidationError);
}

#[cfg(unix)]
mod shell_solver {
    use super::{REFERENCE, fixture, write_file};
    use fierro_regress_core::domain::{FailureMode, RegressErrorCategory};
    use fierro_regress_core::regression::{
        CleanupOutcome, RegressionRunnerConfig, render_human_summary, run_regression,
    };
    use serde_json::Value;
    use std::fs;

    #[test]
    fn drifted_position_fails_and_output_is_cleaned() {
        let temp = fixture(&[
            ("Noh", REFERENCE),
            ("Sedov", REFERENCE),
            ("Sod", drifted().as_str()),
        ]);
        let report_path = temp.path().join("artifacts/report.json");
        let config = RegressionRunnerConfig {
            report_path: Some(report_path.clone()),
            ..shell_config(&temp)
        };

        let report = run_regression(&config).expect("run should complete");

        assert!(!report.passed);
        assert_eq!(report.passed_scenario_count, 2);
        assert_eq!(report.failed_scenario_count, 1);
        let sod = &report.scenarios[2];
        assert_eq!(sod.name, "Sod");
        let points = &sod.fields[0];
        assert_eq!(points.verdict.first_failure.map(|f| f.index), Some(1));
        assert!(
            (points.verdict.max_abs_percent_difference - 1.0e-5).abs() < 1.0e-9,
            "{}",
            points.verdict.max_abs_percent_difference
        );
        assert!(
            report
                .scenarios
                .iter()
                .all(|scenario| scenario.cleanup == CleanupOutcome::Removed)
        );
        assert!(!temp.path().join("vtk").exists());

        let error = report.ensure_passed().expect_err("report should fail");
        assert_eq!(error.category(), RegressErrorCategory::ToleranceViolation);
        assert!(error.message().contains("'Sod'"), "{}", error.message());

        let json: Value = serde_json::from_str(
            &fs::read_to_string(&report_path).expect("report should be written"),
        )
        .expect("report should be JSON");
        assert_eq!(json["passed"], Value::Bool(false));
        assert_eq!(json["scenarios"][2]["passed"], Value::Bool(false));
    }

    #[test]
    fn loose_manifest_threshold_lets_drift_pass() {
        let temp = fixture(&[("Sod", drifted().as_str())]);
        let manifest = write_file(
            &temp.path().join("scenarios.json"),
            r#"{ "threshold": 1e-3, "scenarios": [{ "name": "Sod" }] }"#,
        );
        let config = RegressionRunnerConfig {
            manifest_path: Some(manifest),
            ..shell_config(&temp)
        };

        let report = run_regression(&config).expect("run should complete");
        assert!(report.passed);
        assert_eq!(report.threshold, 1e-3);
        assert!(render_human_summary(&report).contains("Scenario Sod: PASS"));
    }

    #[test]
    fn explicit_threshold_overrides_manifest() {
        let temp = fixture(&[("Sod", drifted().as_str())]);
        let manifest = write_file(
            &temp.path().join("scenarios.json"),
            r#"{ "threshold": 1e-3, "scenarios": [{ "name": "Sod" }] }"#,
        );
        let config = RegressionRunnerConfig {
            manifest_path: Some(manifest),
            threshold: Some(1e-6),
            ..shell_config(&temp)
        };

        let report = run_regression(&config).expect("run should complete");
        assert!(!report.passed);
        assert_eq!(report.threshold, 1e-6);
    }

    #[test]
    fn fail_fast_skips_remaining_default_scenarios() {
        let temp = fixture(&[
            ("Noh", drifted().as_str()),
            ("Sedov", REFERENCE),
            ("Sod", REFERENCE),
        ]);

        let report = run_regression(&shell_config(&temp)).expect("run should complete");

        assert_eq!(report.scenario_count, 1);
        assert_eq!(report.skipped_scenarios, ["Sedov", "Sod"]);
        assert!(!temp.path().join("ran-Sedov").exists());
    }

    #[test]
    fn collect_all_runs_every_default_scenario() {
        let temp = fixture(&[
            ("Noh", drifted().as_str()),
            ("Sedov", REFERENCE),
            ("Sod", REFERENCE),
        ]);
        let config = RegressionRunnerConfig {
            failure_mode: FailureMode::CollectAll,
            ..shell_config(&temp)
        };

        let report = run_regression(&config).expect("run should complete");

        assert_eq!(report.scenario_count, 3);
        assert_eq!(report.failed_scenario_count, 1);
        assert!(report.skipped_scenarios.is_empty());
        assert!(temp.path().join("ran-Sedov").exists());
        assert!(temp.path().join("ran-Sod").exists());
    }

    #[test]
    fn malformed_output_is_a_parse_error_and_still_cleaned() {
        let broken = REFERENCE.replace("1 0 0", "1 0 zero");
        let temp = fixture(&[("Noh", broken.as_str())]);
        let config = RegressionRunnerConfig {
            scenario_patterns: vec!["Noh".to_string()],
            ..shell_config(&temp)
        };

        let error = run_regression(&config).expect_err("parse failure should abort");

        assert_eq!(error.category(), RegressErrorCategory::ParseError);
        assert!(error.message().contains("scenario 'Noh'"), "{}", error.message());
        assert!(!temp.path().join("vtk").exists());
    }

    #[test]
    fn non_zero_solver_exit_is_an_environment_error() {
        let temp = fixture(&[("Noh", REFERENCE)]);
        write_file(
            &temp.path().join("Solver-Inputs/SGH_Noh_simple.yaml"),
            "mkdir -p vtk/data\nexit 9\n",
        );
        let config = RegressionRunnerConfig {
            scenario_patterns: vec!["Noh".to_string()],
            ..shell_config(&temp)
        };

        let error = run_regression(&config).expect_err("solver failure should abort");

        assert_eq!(error.placeholder(), "ENV.SOLVER_EXIT");
        assert!(!temp.path().join("vtk").exists());
    }

    fn drifted() -> String {
        REFERENCE.replace("1 0 0", "1.0000001 0 0")
    }

    fn shell_config(temp: &tempfile::TempDir) -> RegressionRunnerConfig {
        RegressionRunnerConfig {
            executable: "/bin/sh".into(),
            working_dir: temp.path().to_path_buf(),
            ..RegressionRunnerConfig::default()
        }
    }
}

/// Lays out the SGH suite with every reference equal to `REFERENCE`. Each
/// scenario's input deck is a shell script that writes the given output and
/// leaves a `ran-<name>` marker.
fn fixture(outputs: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().expect("tempdir should be created");
    for name in ["Noh", "Sedov", "Sod"] {
        write_file(
            &temp
                .path()
                .join(format!("standard-results/SGH/{}/vtk/data/VTK0.vtk", name)),
            REFERENCE,
        );
    }
    for (name, output) in outputs {
        let output_path = temp.path().join(format!("fresh/{}.vtk", name));
        write_file(&output_path, output);
        write_file(
            &temp
                .path()
                .join(format!("Solver-Inputs/SGH_{}_simple.yaml", name)),
            &format!(
                "mkdir -p vtk/data\ncp fresh/{name}.vtk vtk/data/VTK0.vtk\ntouch ran-{name}\n"
            ),
        );
    }
    temp
}

fn write_file(path: &Path, content: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent dir should be created");
    }
    fs::write(path, content).expect("file should be written");
    path.to_path_buf()
}
