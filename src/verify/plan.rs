//! Rendering build invocations from a template.
//!
//! Baselines and per-feature builds share one template (program + base args
//! + optional manifest path); the plan only appends feature selection flags.

use crate::catalog::{ALL_INTEGRATION_TESTS, FeatureCatalog, FeatureName};
use serde::Serialize;
use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

/// Program and base arguments every build starts from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildTemplate {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub manifest_path: Option<PathBuf>,
}

impl Default for BuildTemplate {
    fn default() -> Self {
        Self {
            program: env::var_os("CARGO").unwrap_or_else(|| OsString::from("cargo")),
            args: vec![OsString::from("check"), OsString::from("--tests")],
            manifest_path: None,
        }
    }
}

impl BuildTemplate {
    fn render(&self, label: String, extra: &[&str]) -> BuildSpec {
        let mut args = self.args.clone();
        if let Some(manifest) = &self.manifest_path {
            args.push(OsString::from("--manifest-path"));
            args.push(manifest.clone().into_os_string());
        }
        args.extend(extra.iter().map(|arg| OsString::from(*arg)));
        BuildSpec {
            label,
            program: self.program.clone(),
            args,
        }
    }
}

/// One fully rendered external build invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildSpec {
    pub label: String,
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl fmt::Display for BuildSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// The warm-up builds, in the order they run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Baseline {
    NoDefaultFeatures,
    DefaultFeatures,
    AllIntegrationTests,
}

impl Baseline {
    pub const ALL: [Baseline; 3] = [
        Baseline::NoDefaultFeatures,
        Baseline::DefaultFeatures,
        Baseline::AllIntegrationTests,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Baseline::NoDefaultFeatures => "no-default-features",
            Baseline::DefaultFeatures => "default-features",
            Baseline::AllIntegrationTests => ALL_INTEGRATION_TESTS,
        }
    }

    pub fn spec(&self, template: &BuildTemplate) -> BuildSpec {
        let label = format!("baseline-{}", self.label());
        match self {
            Baseline::NoDefaultFeatures => template.render(label, &["--no-default-features"]),
            Baseline::DefaultFeatures => template.render(label, &[]),
            Baseline::AllIntegrationTests => {
                template.render(label, &["--features", ALL_INTEGRATION_TESTS])
            }
        }
    }
}

/// An isolated build of one feature, plus the attempts it has used.
#[derive(Clone, Debug)]
pub struct BuildTask {
    pub feature: FeatureName,
    pub spec: BuildSpec,
    pub attempts: u32,
}

impl BuildTask {
    /// Only `feature` is enabled, and cargo is held to one job so parallelism
    /// comes from running several tasks, never from inside one.
    pub fn new(feature: FeatureName, template: &BuildTemplate) -> Self {
        let spec = template.render(
            format!("feature-{}", feature.as_str()),
            &[
                "--no-default-features",
                "--features",
                feature.as_str(),
                "--jobs",
                "1",
            ],
        );
        Self {
            feature,
            spec,
            attempts: 0,
        }
    }
}

/// Everything a verification run would execute, without executing it.
#[derive(Clone, Debug)]
pub struct VerificationPlan {
    pub baselines: Vec<(Baseline, BuildSpec)>,
    pub tasks: Vec<BuildTask>,
}

pub fn plan(catalog: &FeatureCatalog, template: &BuildTemplate) -> VerificationPlan {
    VerificationPlan {
        baselines: Baseline::ALL
            .iter()
            .map(|baseline| (*baseline, baseline.spec(template)))
            .collect(),
        tasks: catalog
            .iter()
            .map(|feature| BuildTask::new(feature.clone(), template))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogFilter, extract_catalog};

    fn template() -> BuildTemplate {
        BuildTemplate {
            program: OsString::from("cargo"),
            args: vec![OsString::from("check"), OsString::from("--tests")],
            manifest_path: Some(PathBuf::from("/work/Cargo.toml")),
        }
    }

    #[test]
    fn baselines_run_in_fixed_order() {
        let rendered: Vec<String> = Baseline::ALL
            .iter()
            .map(|b| b.spec(&template()).to_string())
            .collect();
        assert_eq!(
            rendered,
            vec![
                "cargo check --tests --manifest-path /work/Cargo.toml --no-default-features",
                "cargo check --tests --manifest-path /work/Cargo.toml",
                "cargo check --tests --manifest-path /work/Cargo.toml --features all-integration-tests",
            ]
        );
    }

    #[test]
    fn feature_tasks_are_isolated_and_single_job() {
        let task = BuildTask::new(FeatureName::from("sinks-gcp"), &template());
        assert_eq!(task.spec.label, "feature-sinks-gcp");
        assert_eq!(task.attempts, 0);
        assert_eq!(
            task.spec.to_string(),
            "cargo check --tests --manifest-path /work/Cargo.toml --no-default-features --features sinks-gcp --jobs 1"
        );
    }

    #[test]
    fn plan_has_one_task_per_catalog_entry() {
        let catalog = extract_catalog(
            "[features]\ndefault = []\napi = []\nsinks-http = []\n",
            "Cargo.toml",
            &CatalogFilter::default(),
        )
        .unwrap();
        let plan = plan(&catalog, &template());
        assert_eq!(plan.baselines.len(), 3);
        let features: Vec<&str> = plan.tasks.iter().map(|t| t.feature.as_str()).collect();
        assert_eq!(features, vec!["api", "sinks-http"]);
    }
}
