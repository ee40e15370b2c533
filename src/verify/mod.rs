//! Per-feature build verification.
//!
//! A run has two phases. Three baseline builds go first, one after another,
//! to warm the shared target directory and catch a broken toolchain early; any
//! baseline failure ends the run. Then every catalog feature is built on its
//! own (`--no-default-features --features <name> --jobs 1`) on a bounded
//! worker pool, with a per-task retry budget. The report lists every feature.

pub mod plan;
pub mod pool;
pub mod report;
pub mod retry;
pub mod runner;

pub use plan::{Baseline, BuildSpec, BuildTask, BuildTemplate, VerificationPlan, plan};
pub use report::{BaselineStatus, TaskOutcome, VerificationReport};
pub use retry::RetryPolicy;
pub use runner::{BuildOutput, BuildRunner, CommandRunner};

use crate::catalog::FeatureCatalog;
use crate::error::FlagError;
use std::num::NonZeroUsize;
use std::thread;
use tracing::{error, info, warn};

/// Knobs for a verification run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifySettings {
    /// Maximum number of feature builds in flight.
    pub concurrency: NonZeroUsize,
    pub retry: RetryPolicy,
}

impl Default for VerifySettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            retry: RetryPolicy::default(),
        }
    }
}

pub fn default_concurrency() -> NonZeroUsize {
    thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

/// Run the baselines, then every feature in `catalog`.
///
/// Returns a report for every run that got started; use
/// [`VerificationReport::into_result`] to turn a failed run into an error.
/// `Err` is reserved for a worker pool that could not be created.
pub fn verify(
    catalog: &FeatureCatalog,
    template: &BuildTemplate,
    settings: VerifySettings,
    runner: &dyn BuildRunner,
) -> Result<VerificationReport, FlagError> {
    let plan = plan(catalog, template);

    for (baseline, spec) in &plan.baselines {
        info!(baseline = baseline.label(), "running baseline: {spec}");
        let output = match runner.run(spec) {
            Ok(output) => output,
            Err(err) => {
                warn!(baseline = baseline.label(), "could not start build: {err:#}");
                BuildOutput::failed(None)
            }
        };
        if !output.success {
            error!(
                baseline = baseline.label(),
                exit_code = ?output.exit_code,
                "baseline failed; skipping per-feature builds"
            );
            return Ok(VerificationReport::baseline_failed(*baseline, output.exit_code));
        }
    }

    info!(
        features = plan.tasks.len(),
        concurrency = settings.concurrency.get(),
        retries = settings.retry.retries,
        "baselines passed; checking features in isolation"
    );
    pool::run_pool(
        plan.tasks,
        settings.concurrency.get(),
        settings.retry,
        runner,
        VerificationReport::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogFilter, FeatureName, extract_catalog};
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn catalog() -> FeatureCatalog {
        extract_catalog(
            "[features]\ndefault = [\"api\"]\nall-integration-tests = []\napi = []\nsinks-gcp = []\nsources-file = []\n",
            "Cargo.toml",
            &CatalogFilter::default(),
        )
        .unwrap()
    }

    fn settings(retries: u32) -> VerifySettings {
        VerifySettings {
            concurrency: NonZeroUsize::new(2).unwrap(),
            retry: RetryPolicy { retries },
        }
    }

    #[test]
    fn baseline_failure_starts_no_feature_builds() {
        let seen = Mutex::new(Vec::new());
        let runner = |spec: &BuildSpec| -> anyhow::Result<BuildOutput> {
            seen.lock().unwrap().push(spec.label.clone());
            if spec.label == "baseline-default-features" {
                Ok(BuildOutput::failed(Some(101)))
            } else {
                Ok(BuildOutput::passed())
            }
        };
        let report = verify(&catalog(), &BuildTemplate::default(), settings(2), &runner).unwrap();
        assert_eq!(
            report.baseline,
            BaselineStatus::Failed {
                baseline: Baseline::DefaultFeatures,
                exit_code: Some(101)
            }
        );
        assert!(report.outcomes.is_empty());
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["baseline-no-default-features", "baseline-default-features"]
        );
    }

    #[test]
    fn flaky_feature_passes_within_retry_budget() {
        let attempts: Mutex<HashMap<String, u32>> = Mutex::new(HashMap::new());
        let runner = |spec: &BuildSpec| -> anyhow::Result<BuildOutput> {
            let mut attempts = attempts.lock().unwrap();
            let n = attempts.entry(spec.label.clone()).or_default();
            *n += 1;
            if spec.label == "feature-sinks-gcp" && *n < 3 {
                Ok(BuildOutput::failed(Some(101)))
            } else {
                Ok(BuildOutput::passed())
            }
        };
        let report = verify(&catalog(), &BuildTemplate::default(), settings(2), &runner).unwrap();
        assert!(report.is_success());
        assert_eq!(report.passed, 3);
        assert_eq!(report.outcomes[&FeatureName::from("sinks-gcp")].attempts, 3);
        assert_eq!(report.outcomes[&FeatureName::from("api")].attempts, 1);
    }

    #[test]
    fn every_feature_is_reported() {
        let runner = |spec: &BuildSpec| -> anyhow::Result<BuildOutput> {
            if spec.label.starts_with("feature-s") {
                Ok(BuildOutput::failed(Some(1)))
            } else {
                Ok(BuildOutput::passed())
            }
        };
        let report = verify(&catalog(), &BuildTemplate::default(), settings(0), &runner).unwrap();
        let reported: Vec<&str> = report.outcomes.keys().map(FeatureName::as_str).collect();
        assert_eq!(reported, vec!["api", "sinks-gcp", "sources-file"]);
        assert_eq!(report.failed.len(), 2);
        assert!(report.into_result().is_err());
    }
}
