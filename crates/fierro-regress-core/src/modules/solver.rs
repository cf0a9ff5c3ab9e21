use crate::domain::RegressError;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Runs the solver under test for one scenario and blocks until it exits.
pub trait SolverRunner {
    fn run(&self, input_deck: &Path, working_dir: &Path) -> Result<(), SolverError>;

    fn describe(&self) -> String;
}

#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("solver executable '{}' was not found; build the solver before running the regression suite", path.display())]
    MissingExecutable { path: PathBuf },
    #[error("failed to launch solver '{}': {source}", path.display())]
    Launch {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("solver '{}' failed on input deck '{}' with {status}", path.display(), input_deck.display())]
    Exit {
        path: PathBuf,
        input_deck: PathBuf,
        status: String,
    },
}

impl From<SolverError> for RegressError {
    fn from(error: SolverError) -> Self {
        let message = error.to_string();
        match error {
            SolverError::MissingExecutable { .. } => {
                RegressError::environment("ENV.SOLVER_MISSING", message)
            }
            SolverError::Launch { .. } => RegressError::environment("ENV.SOLVER_LAUNCH", message),
            SolverError::Exit { .. } => RegressError::environment("ENV.SOLVER_EXIT", message),
        }
    }
}

/// Solver invoked as a subprocess: `<executable> <input-deck>`, with the
/// scenario working directory as its current directory.
#[derive(Debug, Clone)]
pub struct ProcessSolver {
    executable: PathBuf,
}

impl ProcessSolver {
    /// Pre-flight check: resolves `executable` against `working_dir` and
    /// fails unless it names an existing file.
    pub fn locate(executable: impl AsRef<Path>, working_dir: &Path) -> Result<Self, SolverError> {
        let executable = executable.as_ref();
        let resolved = if executable.is_absolute() {
            executable.to_path_buf()
        } else {
            working_dir.join(executable)
        };

        if !resolved.is_file() {
            return Err(SolverError::MissingExecutable { path: resolved });
        }

        Ok(Self {
            executable: resolved,
        })
    }
}

impl SolverRunner for ProcessSolver {
    fn run(&self, input_deck: &Path, working_dir: &Path) -> Result<(), SolverError> {
        tracing::debug!(
            executable = %self.executable.display(),
            input_deck = %input_deck.display(),
            working_dir = %working_dir.display(),
            "launching solver"
        );

        let status = Command::new(&self.executable)
            .arg(input_deck)
            .current_dir(working_dir)
            .status()
            .map_err(|source| SolverError::Launch {
                path: self.executable.clone(),
                source,
            })?;

        if status.success() {
            return Ok(());
        }

        let status_text = status.code().map_or_else(
            || "termination by signal".to_string(),
            |code| format!("exit code {}", code),
        );
        Err(SolverError::Exit {
            path: self.executable.clone(),
            input_deck: input_deck.to_path_buf(),
            status: status_text,
        })
    }

    fn describe(&self) -> String {
        self.executable.display().to_string()
    }
}
