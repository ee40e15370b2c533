//! Executing build specs.
//!
//! `BuildRunner` is the seam between orchestration and the outside world: the
//! verifier only ever asks a runner to run one spec and report how it ended.

use crate::verify::plan::BuildSpec;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::warn;

/// How one build attempt ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildOutput {
    pub success: bool,
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub log_path: Option<PathBuf>,
}

impl BuildOutput {
    pub fn passed() -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            log_path: None,
        }
    }

    pub fn failed(exit_code: Option<i32>) -> Self {
        Self {
            success: false,
            exit_code,
            log_path: None,
        }
    }
}

/// Runs one build and reports the outcome.
///
/// An `Err` means the build could not be started at all; callers treat it as
/// a failed attempt.
pub trait BuildRunner: Sync {
    fn run(&self, spec: &BuildSpec) -> Result<BuildOutput>;
}

impl<F> BuildRunner for F
where
    F: Fn(&BuildSpec) -> Result<BuildOutput> + Sync,
{
    fn run(&self, spec: &BuildSpec) -> Result<BuildOutput> {
        self(spec)
    }
}

/// Runs builds as child processes.
///
/// With a log directory, stdout and stderr of each attempt land in
/// `<log_dir>/<label>.log`; otherwise the child inherits our stderr and its
/// stdout is discarded so the report owns stdout.
#[derive(Clone, Debug, Default)]
pub struct CommandRunner {
    log_dir: Option<PathBuf>,
}

impl CommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    fn log_path(&self, label: &str) -> Option<PathBuf> {
        self.log_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.log", sanitize_label(label))))
    }
}

impl BuildRunner for CommandRunner {
    fn run(&self, spec: &BuildSpec) -> Result<BuildOutput> {
        let mut command = Command::new(&spec.program);
        command.args(&spec.args).stdin(Stdio::null());

        let Some(path) = self.log_path(&spec.label) else {
            let status = command
                .stdout(Stdio::null())
                .stderr(Stdio::inherit())
                .status()
                .with_context(|| format!("failed to execute {spec}"))?;
            return Ok(BuildOutput {
                success: status.success(),
                exit_code: status.code(),
                log_path: None,
            });
        };

        let output = command
            .output()
            .with_context(|| format!("failed to execute {spec}"))?;
        // The build already finished; a log we cannot write must not change
        // its outcome.
        let log_path = match write_log(&path, spec, &output.stdout, &output.stderr) {
            Ok(()) => Some(path),
            Err(err) => {
                warn!(label = spec.label.as_str(), "could not write build log: {err:#}");
                None
            }
        };
        Ok(BuildOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            log_path,
        })
    }
}

fn write_log(path: &Path, spec: &BuildSpec, stdout: &[u8], stderr: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log dir {}", parent.display()))?;
    }
    let mut file =
        fs::File::create(path).with_context(|| format!("creating log {}", path.display()))?;
    writeln!(file, "$ {spec}")?;
    file.write_all(stdout)?;
    file.write_all(stderr)?;
    Ok(())
}

fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_become_safe_file_names() {
        assert_eq!(sanitize_label("feature-sinks-gcp"), "feature-sinks-gcp");
        assert_eq!(sanitize_label("feature-a/b c"), "feature-a_b_c");
    }

    fn spec(program: &str) -> BuildSpec {
        BuildSpec {
            label: "feature-api".to_string(),
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[cfg(unix)]
    #[test]
    fn unwritable_log_keeps_build_outcome() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let not_a_dir = temp.path().join("not-a-dir");
        fs::write(&not_a_dir, "").unwrap();

        let output = CommandRunner::new()
            .with_log_dir(&not_a_dir)
            .run(&spec("true"))
            .unwrap();
        assert!(output.success);
        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.log_path, None);
    }

    #[cfg(unix)]
    #[test]
    fn log_file_starts_with_the_command_line() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let output = CommandRunner::new()
            .with_log_dir(temp.path().join("logs"))
            .run(&spec("false"))
            .unwrap();
        assert!(!output.success);
        let log = output.log_path.expect("log written");
        assert_eq!(log, temp.path().join("logs").join("feature-api.log"));
        assert!(fs::read_to_string(&log).unwrap().starts_with("$ false"));
    }

    #[test]
    fn log_path_only_with_log_dir() {
        assert_eq!(CommandRunner::new().log_path("x"), None);
        let runner = CommandRunner::new().with_log_dir("/tmp/logs");
        assert_eq!(
            runner.log_path("baseline-default-features"),
            Some(PathBuf::from("/tmp/logs/baseline-default-features.log"))
        );
    }
}
