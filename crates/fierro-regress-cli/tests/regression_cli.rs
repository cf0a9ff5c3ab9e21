use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const REFERENCE: &str = "\
# vtk DataFile Version 2.0
Mesh for Fierro
ASCII
DATASET UNSTRUCTURED_GRID
POINTS 2 float
0 0 0
1 0 0

POINT_DATA 2
SCALARS density float 1
LOOKUP_TABLE default
1.0
2.0
";

#[test]
fn run_without_solver_exits_with_environment_code() {
    let temp = TempDir::new().expect("tempdir should be created");

    let output = fierro_regress(&[
        "run",
        "--working-dir",
        path_arg(temp.path()),
        "--executable",
        "bin/missing-solver",
    ]);

    assert_eq!(
        output.status.code(),
        Some(4),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: [ENV.SOLVER_MISSING]"), "{stderr}");
    assert!(stderr.contains("FATAL EXIT CODE: 4"), "{stderr}");
}

#[test]
fn unknown_flag_is_a_usage_error() {
    let output = fierro_regress(&["run", "--bogus"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("INPUT.CLI_USAGE"));
}

#[test]
fn help_exits_zero() {
    let output = fierro_regress(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("run"), "{stdout}");
    assert!(stdout.contains("compare"), "{stdout}");
}

#[test]
fn compare_identical_files_passes() {
    let temp = TempDir::new().expect("tempdir should be created");
    let reference = write_file(&temp.path().join("reference.vtk"), REFERENCE);
    let candidate = write_file(&temp.path().join("candidate.vtk"), REFERENCE);

    let output = fierro_regress(&[
        "compare",
        "--reference",
        path_arg(&reference),
        "--candidate",
        path_arg(&candidate),
    ]);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Comparison status: PASS"), "{stdout}");
    assert!(stdout.contains("Field POINTS (vector): 2 element(s)"), "{stdout}");
}

#[test]
fn compare_scalar_drift_exits_one() {
    let temp = TempDir::new().expect("tempdir should be created");
    let reference = write_file(&temp.path().join("reference.vtk"), REFERENCE);
    let candidate = write_file(
        &temp.path().join("candidate.vtk"),
        &REFERENCE.replace("1.0\n2.0", "1.0\n2.5"),
    );

    let output = fierro_regress(&[
        "compare",
        "--reference",
        path_arg(&reference),
        "--candidate",
        path_arg(&candidate),
        "--keyword",
        "density",
        "--kind",
        "scalar",
        "--threshold",
        "1.0",
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Comparison status: FAIL"), "{stdout}");
    assert!(stdout.contains("first at element 1"), "{stdout}");
}

#[test]
fn compare_point_count_mismatch_exits_with_shape_code() {
    let temp = TempDir::new().expect("tempdir should be created");
    let reference = write_file(&temp.path().join("reference.vtk"), REFERENCE);
    let candidate = write_file(
        &temp.path().join("candidate.vtk"),
        &REFERENCE.replace("1 0 0\n\n", "1 0 0\n2 0 0\n\n"),
    );

    let output = fierro_regress(&[
        "compare",
        "--reference",
        path_arg(&reference),
        "--candidate",
        path_arg(&candidate),
    ]);

    assert_eq!(output.status.code(), Some(6));
    assert!(String::from_utf8_lossy(&output.stderr).contains("SHAPE.LENGTH"));
}

#[test]
fn compare_rejects_non_positive_threshold() {
    let temp = TempDir::new().expect("tempdir should be created");
    let reference = write_file(&temp.path().join("reference.vtk"), REFERENCE);

    let output = fierro_regress(&[
        "compare",
        "--reference",
        path_arg(&reference),
        "--candidate",
        path_arg(&reference),
        "--threshold",
        "0",
    ]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("INPUT.THRESHOLD"));
}

#[test]
fn compare_rejects_blank_keyword() {
    let temp = TempDir::new().expect("tempdir should be created");
    let reference = write_file(&temp.path().join("reference.vtk"), REFERENCE);

    let output = fierro_regress(&[
        "compare",
        "--reference",
        path_arg(&reference),
        "--candidate",
        path_arg(&reference),
        "--keyword",
        "",
    ]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("INPUT.FIELD_KEYWORD"));
    assert!(String::from_utf8_lossy(&output.stdout).is_empty());
}

#[cfg(unix)]
mod shell_solver {
    use super::{REFERENCE, fierro_regress, path_arg, write_file};
    use serde_json::Value;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn passing_suite_exits_zero_and_writes_report() {
        let temp = suite(REFERENCE);
        let report_path = temp.path().join("report/report.json");

        let output = fierro_regress(&[
            "run",
            "--executable",
            "/bin/sh",
            "--working-dir",
            path_arg(temp.path()),
            "--report",
            path_arg(&report_path),
        ]);

        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Regression status: PASS"), "{stdout}");
        assert!(stdout.contains("Scenario Sedov: PASS"), "{stdout}");
        assert!(stdout.contains("JSON report:"), "{stdout}");
        assert!(!temp.path().join("vtk").exists());

        let parsed: Value = serde_json::from_str(
            &fs::read_to_string(&report_path).expect("report should be readable"),
        )
        .expect("report JSON should parse");
        assert_eq!(parsed["passed"], Value::Bool(true));
        assert_eq!(parsed["scenario_count"], Value::from(3));
    }

    #[test]
    fn drifted_output_exits_one_and_names_scenario() {
        let temp = suite(&REFERENCE.replace("1 0 0", "1.0000001 0 0"));

        let output = fierro_regress(&[
            "run",
            "--executable",
            "/bin/sh",
            "--working-dir",
            path_arg(temp.path()),
            "--scenario",
            "Noh",
        ]);

        assert_eq!(
            output.status.code(),
            Some(1),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Regression status: FAIL"), "{stdout}");
        assert!(stdout.contains("Scenario Noh: FAIL"), "{stdout}");
    }

    #[test]
    fn keep_going_with_json_output_reports_every_scenario() {
        let temp = suite(&REFERENCE.replace("1 0 0", "1.0000001 0 0"));

        let output = fierro_regress(&[
            "run",
            "--executable",
            "/bin/sh",
            "--working-dir",
            path_arg(temp.path()),
            "--keep-going",
            "--json",
            "-q",
        ]);

        assert_eq!(output.status.code(), Some(1));
        let parsed: Value =
            serde_json::from_slice(&output.stdout).expect("stdout should be the JSON report");
        assert_eq!(parsed["failure_mode"], Value::from("collect_all"));
        assert_eq!(parsed["failed_scenario_count"], Value::from(3));
        assert_eq!(parsed["skipped_scenarios"], Value::Array(Vec::new()));
    }

    #[test]
    fn manifest_threshold_applies_unless_flag_overrides() {
        let temp = suite(&REFERENCE.replace("1 0 0", "1.0000001 0 0"));
        let manifest = write_file(
            &temp.path().join("scenarios.json"),
            r#"{ "threshold": 1e-3, "scenarios": [{ "name": "Sod" }] }"#,
        );
        let base = [
            "run",
            "--executable",
            "/bin/sh",
            "--working-dir",
            path_arg(temp.path()),
            "--manifest",
            path_arg(&manifest),
        ];

        let loose = fierro_regress(&base);
        assert_eq!(loose.status.code(), Some(0));

        let mut strict_args = base.to_vec();
        strict_args.extend(["--threshold", "1e-6"]);
        let strict = fierro_regress(&strict_args);
        assert_eq!(strict.status.code(), Some(1));
    }

    /// SGH layout whose input decks are shell scripts writing `output` as the
    /// solver result.
    fn suite(output: &str) -> TempDir {
        let temp = TempDir::new().expect("tempdir should be created");
        write_file(&temp.path().join("fresh.vtk"), output);
        for name in ["Noh", "Sedov", "Sod"] {
            write_file(
                &temp
                    .path()
                    .join(format!("standard-results/SGH/{}/vtk/data/VTK0.vtk", name)),
                REFERENCE,
            );
            write_file(
                &temp
                    .path()
                    .join(format!("Solver-Inputs/SGH_{}_simple.yaml", name)),
                "mkdir -p vtk/data\ncp fresh.vtk vtk/data/VTK0.vtk\n",
            );
        }
        temp
    }
}

fn fierro_regress(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fierro-regress"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("fierro-regress should run")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("test paths should be UTF-8")
}

fn write_file(path: &Path, content: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent dir should be created");
    }
    fs::write(path, content).expect("file should be written");
    path.to_path_buf()
}
