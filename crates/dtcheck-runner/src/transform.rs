//! The transformation pipeline collaborator.

use std::path::PathBuf;
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Result of one transformation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome {
    Succeeded,
    Failed { reason: String },
}

/// Builds target tables from source tables.
pub trait Transformer {
    fn run(&self) -> TransformOutcome;
}

/// `[transform]` section of the harness configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub command: String,
    pub args: Vec<String>,
    pub project_dir: PathBuf,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            command: "dbt".to_string(),
            args: vec!["run".to_string()],
            project_dir: PathBuf::from("."),
        }
    }
}

/// Runs an external command: `<command> <args...> --project-dir <dir>`.
///
/// Output is inherited so the pipeline's own log lands on the console.
#[derive(Debug, Clone)]
pub struct CommandTransformer {
    config: TransformConfig,
}

impl CommandTransformer {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    fn display_command(&self) -> String {
        let mut parts = vec![self.config.command.clone()];
        parts.extend(self.config.args.iter().cloned());
        parts.push("--project-dir".to_string());
        parts.push(self.config.project_dir.display().to_string());
        parts.join(" ")
    }
}

impl Transformer for CommandTransformer {
    fn run(&self) -> TransformOutcome {
        let command_line = self.display_command();
        info!(command = %command_line, "running transformation");
        let status = Command::new(&self.config.command)
            .args(&self.config.args)
            .arg("--project-dir")
            .arg(&self.config.project_dir)
            .status();
        match status {
            Ok(status) if status.success() => TransformOutcome::Succeeded,
            Ok(status) => {
                warn!(command = %command_line, %status, "transformation exited unsuccessfully");
                TransformOutcome::Failed {
                    reason: format!("`{command_line}` exited with {status}"),
                }
            }
            Err(error) => TransformOutcome::Failed {
                reason: format!("failed to start `{}`: {error}", self.config.command),
            },
        }
    }
}
