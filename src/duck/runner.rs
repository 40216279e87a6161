//! SQL execution against DuckDB
//!
//! Scripts are piped to the `duckdb` command-line shell on stdin; whatever
//! the shell prints (query results in its box format) is returned.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;

use super::DuckError;

/// Database a script runs against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Database {
    /// Transient in-memory database
    InMemory,
    /// Database file, created on first use
    File(PathBuf),
}

impl Database {
    pub fn file(path: impl AsRef<Path>) -> Self {
        Database::File(path.as_ref().to_path_buf())
    }
}

/// Executes SQL scripts
pub trait SqlRunner: Send + Sync {
    /// Run `statements` in order against `database` and return the printed output
    fn run(&self, database: &Database, statements: &[String]) -> Result<String, DuckError>;
}

/// Runner backed by the `duckdb` CLI
#[derive(Debug, Clone)]
pub struct DuckCli {
    program: PathBuf,
}

impl DuckCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for DuckCli {
    fn default() -> Self {
        Self::new("duckdb")
    }
}

impl SqlRunner for DuckCli {
    fn run(&self, database: &Database, statements: &[String]) -> Result<String, DuckError> {
        let mut command = Command::new(&self.program);
        // -bail stops at the first failing statement
        command.arg("-bail");
        if let Database::File(path) = database {
            command.arg(path);
        }

        for statement in statements {
            tracing::debug!("{}", statement);
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DuckError::Spawn {
                program: self.program.display().to_string(),
                source: e,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            let mut script = statements.join("\n");
            script.push('\n');
            // The shell may exit before reading everything; its stderr says why
            match stdin.write_all(script.as_bytes()) {
                Err(e) if e.kind() != io::ErrorKind::BrokenPipe => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(e.into());
                }
                _ => {}
            }
        }

        let output = child.wait_with_output()?;
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        // The shell can exit 0 after reporting an error on stderr
        if !output.status.success() || stderr.starts_with("Error") {
            return Err(DuckError::StatementFailed {
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// A script handed to a [`RecordingRunner`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedScript {
    pub database: Database,
    pub statements: Vec<String>,
}

/// Runner that records scripts instead of executing them
#[derive(Debug, Default)]
pub struct RecordingRunner {
    scripts: Mutex<Vec<RecordedScript>>,
    output: String,
    fail_on: Option<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output returned for every script
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// Fail any script containing a statement with this fragment
    pub fn failing_on(mut self, fragment: impl Into<String>) -> Self {
        self.fail_on = Some(fragment.into());
        self
    }

    pub fn scripts(&self) -> Vec<RecordedScript> {
        self.scripts.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Every statement run, across scripts
    pub fn statements(&self) -> Vec<String> {
        self.scripts()
            .into_iter()
            .flat_map(|s| s.statements)
            .collect()
    }
}

impl SqlRunner for RecordingRunner {
    fn run(&self, database: &Database, statements: &[String]) -> Result<String, DuckError> {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.push(RecordedScript {
                database: database.clone(),
                statements: statements.to_vec(),
            });
        }

        if let Some(fragment) = &self.fail_on {
            if statements.iter().any(|s| s.contains(fragment.as_str())) {
                return Err(DuckError::StatementFailed {
                    status: "exit status: 1".to_string(),
                    stderr: format!("Error: statement containing '{}' failed", fragment),
                });
            }
        }

        Ok(self.output.clone())
    }
}
