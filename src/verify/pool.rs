//! Bounded worker pool for per-feature builds.
//!
//! Tasks run on a dedicated rayon pool sized to the concurrency limit, so at
//! most `workers` builds are in flight. A failing task never stops its
//! siblings.

use crate::error::FlagError;
use crate::verify::plan::BuildTask;
use crate::verify::report::{TaskOutcome, VerificationReport};
use crate::verify::retry::{RetryPolicy, run_with_retries};
use crate::verify::runner::BuildRunner;
use rayon::prelude::*;
use std::sync::{Mutex, PoisonError};
use tracing::{error, info};

/// Run every task and fold the outcomes into `report`.
pub fn run_pool(
    tasks: Vec<BuildTask>,
    workers: usize,
    policy: RetryPolicy,
    runner: &dyn BuildRunner,
    report: VerificationReport,
) -> Result<VerificationReport, FlagError> {
    let total = tasks.len();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|idx| format!("flagcheck-worker-{idx}"))
        .build()
        .map_err(|source| FlagError::WorkerPool { source })?;
    let report = Mutex::new(report);

    pool.install(|| {
        // One task per split: builds are long and blocking, so batching
        // several onto one worker would serialize them.
        tasks
            .into_par_iter()
            .with_max_len(1)
            .for_each(|mut task| {
                let output = run_with_retries(&mut task, runner, policy);
                let outcome = TaskOutcome {
                    feature: task.feature.clone(),
                    passed: output.success,
                    attempts: task.attempts,
                    exit_code: output.exit_code,
                    log_path: output.log_path,
                };

                let mut report = report.lock().unwrap_or_else(PoisonError::into_inner);
                report.record(outcome);
                let done = report.outcomes.len();
                if output.success {
                    info!(
                        feature = task.feature.as_str(),
                        attempts = task.attempts,
                        "[{done}/{total}] passed"
                    );
                } else {
                    error!(
                        feature = task.feature.as_str(),
                        attempts = task.attempts,
                        exit_code = ?output.exit_code,
                        "[{done}/{total}] failed"
                    );
                }
            });
    });

    Ok(report.into_inner().unwrap_or_else(PoisonError::into_inner))
}
