//! Bounded retry for a single build task.

use crate::verify::plan::BuildTask;
use crate::verify::runner::{BuildOutput, BuildRunner};
use tracing::{debug, warn};

/// Retry budget for one task: the first attempt plus `retries` more.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { retries: 2 }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

/// Run `task` until it passes or the budget is spent.
///
/// Spawn errors count as failed attempts. The returned output is from the
/// last attempt; `task.attempts` records how many were used.
pub fn run_with_retries(
    task: &mut BuildTask,
    runner: &dyn BuildRunner,
    policy: RetryPolicy,
) -> BuildOutput {
    let max_attempts = policy.max_attempts();
    loop {
        task.attempts = task.attempts.saturating_add(1);
        let output = match runner.run(&task.spec) {
            Ok(output) => output,
            Err(err) => {
                warn!(feature = task.feature.as_str(), "could not start build: {err:#}");
                BuildOutput::failed(None)
            }
        };

        if output.success {
            return output;
        }
        if task.attempts >= max_attempts {
            return output;
        }
        debug!(
            feature = task.feature.as_str(),
            attempt = task.attempts,
            max_attempts,
            exit_code = ?output.exit_code,
            "build failed; retrying"
        );
    }
}
