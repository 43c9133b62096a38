//! Runs the external `ledger` binary for reports.
//!
//! The output is passed through untouched; nothing here interprets it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to run {}: {source}", .binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stderr}")]
    Failed { status: Option<i32>, stderr: String },

    #[error("engine output is not valid UTF-8: {0}")]
    InvalidOutput(#[from] std::string::FromUtf8Error),
}

impl EngineError {
    /// Text to show the user: the engine's own error output when it has any.
    pub fn user_message(&self) -> String {
        match self {
            EngineError::Failed { status, stderr } if stderr.trim().is_empty() => match status {
                Some(code) => format!("ledger exited with status {}", code),
                None => "ledger was terminated by a signal".to_string(),
            },
            EngineError::Failed { stderr, .. } => stderr.clone(),
            other => other.to_string(),
        }
    }
}

/// Report verbs understood by the engine.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Report {
    Balance,
    Cleared,
    Register,
    Stats,
}

impl Report {
    pub fn verb(&self) -> &'static str {
        match self {
            Report::Balance => "balance",
            Report::Cleared => "cleared",
            Report::Register => "register",
            Report::Stats => "stats",
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.verb())
    }
}

///
/// How to invoke the engine: the binary, the journal passed with `-f`, and
/// any extra arguments placed before the report verb.
///
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerEngine {
    pub binary: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    pub extra_args: Vec<String>,
}

impl Default for LedgerEngine {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("ledger"),
            file: None,
            extra_args: Vec::new(),
        }
    }
}

impl LedgerEngine {
    pub fn new<P: AsRef<Path>>(binary: P) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn with_file<P: AsRef<Path>>(mut self, file: P) -> Self {
        self.file = Some(file.as_ref().to_path_buf());
        self
    }

    pub fn with_args(mut self, args: &[&str]) -> Self {
        self.extra_args = args.iter().map(|arg| arg.to_string()).collect();
        self
    }

    /// Expands `~` and environment variables in the configured paths.
    pub(crate) fn expanded(mut self) -> Self {
        self.binary = expand_path(&self.binary);
        self.file = self.file.as_deref().map(expand_path);
        self
    }

    pub fn command(&self, report: Report, account: Option<&str>) -> Command {
        let mut command = Command::new(&self.binary);
        if let Some(ref file) = self.file {
            command.arg("-f").arg(file);
        }
        command.args(&self.extra_args).arg(report.verb());
        if let Some(account) = account {
            command.arg(account);
        }
        command
    }

    /// Runs `report`, optionally restricted to `account`, and returns its standard output.
    pub fn run(&self, report: Report, account: Option<&str>) -> Result<String, EngineError> {
        tracing::debug!(binary = %self.binary.display(), %report, ?account, "running engine");

        let output = self
            .command(report, account)
            .output()
            .map_err(|source| EngineError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            tracing::debug!(status = ?output.status.code(), "engine failed");
            return Err(EngineError::Failed {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            });
        }

        Ok(String::from_utf8(output.stdout)?)
    }
}

fn expand_path(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    match shellexpand::full(&path_str) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path.to_path_buf(),
    }
}
