//! Aggregation of per-feature outcomes.
//!
//! Outcomes are keyed by feature name, so the finished report is the same no
//! matter which order the workers completed in.

use crate::catalog::FeatureName;
use crate::error::FlagError;
use crate::verify::plan::Baseline;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Terminal result of one feature's build task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TaskOutcome {
    pub feature: FeatureName,
    pub passed: bool,
    pub attempts: u32,
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BaselineStatus {
    Passed,
    Failed {
        baseline: Baseline,
        exit_code: Option<i32>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub baseline: BaselineStatus,
    pub passed: usize,
    pub failed: BTreeSet<FeatureName>,
    pub outcomes: BTreeMap<FeatureName, TaskOutcome>,
}

impl VerificationReport {
    pub fn new() -> Self {
        Self {
            baseline: BaselineStatus::Passed,
            passed: 0,
            failed: BTreeSet::new(),
            outcomes: BTreeMap::new(),
        }
    }

    /// A report for a run that stopped at a failed baseline.
    pub fn baseline_failed(baseline: Baseline, exit_code: Option<i32>) -> Self {
        Self {
            baseline: BaselineStatus::Failed {
                baseline,
                exit_code,
            },
            ..Self::new()
        }
    }

    pub fn record(&mut self, outcome: TaskOutcome) {
        if outcome.passed {
            self.passed += 1;
        } else {
            self.failed.insert(outcome.feature.clone());
        }
        self.outcomes.insert(outcome.feature.clone(), outcome);
    }

    pub fn is_success(&self) -> bool {
        matches!(self.baseline, BaselineStatus::Passed) && self.failed.is_empty()
    }

    /// Collapse the report into the error a failed run should surface.
    pub fn into_result(self) -> Result<Self, FlagError> {
        if let BaselineStatus::Failed {
            baseline,
            exit_code,
        } = &self.baseline
        {
            return Err(FlagError::BaselineFailure {
                label: baseline.label().to_string(),
                exit_code: *exit_code,
            });
        }
        if !self.failed.is_empty() {
            return Err(FlagError::BuildFailure {
                failed: self.failed.iter().cloned().collect(),
            });
        }
        Ok(self)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for VerificationReport {
    fn default() -> Self {
        Self::new()
    }
}
