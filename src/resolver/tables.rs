//! Rename tables and denylist used by the resolver.
//!
//! Most component types map 1:1 onto a feature suffix; the tables only list
//! the exceptions. They are plain data so a checkout can ship its own copy next
//! to the component registry (see `FLAGCHECK_RENAME_TABLES`).

use crate::catalog::{ComponentCategory, ComponentType, FeatureName};
use crate::error::FlagError;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

const SOURCE_RENAMES: &[(&str, &str)] = &[
    ("prometheus_remote_write", "prometheus"),
    ("prometheus_scrape", "prometheus"),
    ("splunk_hec", "splunk_hec"),
];

const TRANSFORM_RENAMES: &[(&str, &str)] = &[("swimlanes", "route")];

const SINK_RENAMES: &[(&str, &str)] = &[
    ("gcp_cloud_storage", "gcp"),
    ("gcp_pubsub", "gcp"),
    ("gcp_stackdriver_logs", "gcp"),
    ("gcp_stackdriver_metrics", "gcp"),
    ("prometheus_exporter", "prometheus"),
    ("prometheus_remote_write", "prometheus"),
    ("splunk_hec_logs", "splunk_hec"),
];

// Compiled into every build; there is no flag to turn on.
const DENYLIST: &[&str] = &["transforms-log_to_metric"];

/// Component type → feature suffix for one category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RenameMap(BTreeMap<ComponentType, String>);

impl RenameMap {
    fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        RenameMap(
            pairs
                .iter()
                .map(|(ty, suffix)| (ComponentType::from(*ty), suffix.to_string()))
                .collect(),
        )
    }

    /// The feature suffix for `ty`, or `None` when the type is not listed.
    pub fn lookup(&self, ty: &ComponentType) -> Option<&str> {
        self.0.get(ty).map(String::as_str)
    }
}

/// The three per-category rename maps plus the denylist.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameTables {
    #[serde(default)]
    pub sources: RenameMap,
    #[serde(default)]
    pub transforms: RenameMap,
    #[serde(default)]
    pub sinks: RenameMap,
    #[serde(default)]
    pub denylist: BTreeSet<FeatureName>,
}

impl Default for RenameTables {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RenameTables {
    /// Tables matching the component registry this crate was written against.
    pub fn builtin() -> Self {
        Self {
            sources: RenameMap::from_pairs(SOURCE_RENAMES),
            transforms: RenameMap::from_pairs(TRANSFORM_RENAMES),
            sinks: RenameMap::from_pairs(SINK_RENAMES),
            denylist: DENYLIST.iter().map(|name| FeatureName::from(*name)).collect(),
        }
    }

    /// Tables with no renames and an empty denylist.
    pub fn identity() -> Self {
        Self {
            sources: RenameMap::default(),
            transforms: RenameMap::default(),
            sinks: RenameMap::default(),
            denylist: BTreeSet::new(),
        }
    }

    pub fn for_category(&self, category: ComponentCategory) -> &RenameMap {
        match category {
            ComponentCategory::Sources => &self.sources,
            ComponentCategory::Transforms => &self.transforms,
            ComponentCategory::Sinks => &self.sinks,
        }
    }

    pub fn is_denied(&self, feature: &FeatureName) -> bool {
        self.denylist.contains(feature)
    }

    /// Parse a TOML table file. Missing keys fall back to empty maps, not to
    /// the built-in tables.
    pub fn from_toml_str(contents: &str, origin: &str) -> Result<Self, FlagError> {
        toml::from_str(contents).map_err(|err| FlagError::parse(origin, err.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self, FlagError> {
        let contents = fs::read_to_string(path).map_err(|err| FlagError::io(path, err))?;
        Self::from_toml_str(&contents, &path.display().to_string())
    }
}
