//! Config-to-feature resolution.
//!
//! Given a parsed pipeline config and a set of rename tables, compute the
//! smallest set of cargo features a binary needs to run that config:
//! `api`/`enterprise` when those sections are set, plus one
//! `<category>-<name>` feature per distinct component type, minus anything on
//! the denylist.

pub mod config;
pub mod tables;

pub use config::{ComponentDef, ConfigFormat, PipelineConfig};
pub use tables::{RenameMap, RenameTables};

use crate::catalog::{ComponentCategory, ComponentType, FeatureName};
use crate::error::FlagError;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Sorted features required by a config.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedFeatureSet {
    features: BTreeSet<FeatureName>,
    /// Component types that had no rename entry and were used verbatim.
    #[serde(skip)]
    unmapped: BTreeSet<(ComponentCategory, ComponentType)>,
}

impl ResolvedFeatureSet {
    pub fn iter(&self) -> impl Iterator<Item = &FeatureName> {
        self.features.iter()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.features.contains(&FeatureName::from(name))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn unmapped(&self) -> impl Iterator<Item = &(ComponentCategory, ComponentType)> {
        self.unmapped.iter()
    }

    /// Comma-joined list, the format `cargo --features` accepts.
    pub fn to_feature_list(&self) -> String {
        self.features
            .iter()
            .map(FeatureName::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Compute the features `config` needs under `tables`.
pub fn resolve(config: &PipelineConfig, tables: &RenameTables) -> ResolvedFeatureSet {
    let mut features: BTreeSet<FeatureName> = config
        .base_features()
        .map(FeatureName::from)
        .collect();
    let mut unmapped = BTreeSet::new();

    for category in ComponentCategory::ALL {
        let renames = tables.for_category(category);
        let types: BTreeSet<&ComponentType> = config
            .components(category)
            .values()
            .map(|def| &def.component_type)
            .collect();

        for ty in types {
            let suffix = match renames.lookup(ty) {
                Some(renamed) => renamed,
                None => {
                    unmapped.insert((category, ty.clone()));
                    ty.as_str()
                }
            };
            features.insert(category.feature_for(suffix));
        }
    }

    features.retain(|feature| {
        let denied = tables.is_denied(feature);
        if denied {
            debug!(feature = feature.as_str(), "dropping statically compiled feature");
        }
        !denied
    });

    ResolvedFeatureSet { features, unmapped }
}

/// Load `path` (format chosen by extension) and resolve its features.
pub fn resolve_path(path: &Path, tables: &RenameTables) -> Result<ResolvedFeatureSet, FlagError> {
    let config = PipelineConfig::load(path)?;
    let resolved = resolve(&config, tables);
    for (category, ty) in resolved.unmapped() {
        debug!(
            category = category.as_str(),
            component_type = ty.as_str(),
            "no rename entry; using the component type as the feature suffix"
        );
    }
    Ok(resolved)
}
