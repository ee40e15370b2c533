//! The feature catalog produced by the extractor and the filter that shapes it.

use crate::catalog::identity::FeatureName;
use crate::error::FlagError;
use serde::Serialize;

/// Names the extractor leaves out of the catalog.
///
/// `sentinels` are matched exactly; anything ending in `utility_suffix` is a
/// helper feature that only exists to be enabled by other features.
#[derive(Clone, Debug)]
pub struct CatalogFilter {
    pub utility_suffix: String,
    pub sentinels: Vec<String>,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self {
            utility_suffix: "-utils".to_string(),
            sentinels: vec![
                "default".to_string(),
                ALL_INTEGRATION_TESTS.to_string(),
            ],
        }
    }
}

/// Feature that turns on every integration-test feature at once.
pub const ALL_INTEGRATION_TESTS: &str = "all-integration-tests";

impl CatalogFilter {
    pub fn admits(&self, name: &str) -> bool {
        !name.ends_with(&self.utility_suffix) && !self.sentinels.iter().any(|s| s == name)
    }
}

/// Sorted, duplicate-free list of optional features.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeatureCatalog {
    features: Vec<FeatureName>,
}

impl FeatureCatalog {
    /// Callers must pass sorted, distinct names.
    pub(crate) fn from_sorted(features: Vec<FeatureName>) -> Self {
        debug_assert!(features.windows(2).all(|w| w[0] < w[1]));
        Self { features }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureName> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn contains(&self, name: &FeatureName) -> bool {
        self.features.binary_search(name).is_ok()
    }

    /// Narrow the catalog to an explicit subset.
    ///
    /// Every requested name must already be in the catalog; asking for an
    /// unknown feature is an error rather than a silent no-op.
    pub fn select(&self, requested: &[String]) -> Result<FeatureCatalog, FlagError> {
        let mut picked = Vec::with_capacity(requested.len());
        for raw in requested {
            let name = FeatureName(raw.clone());
            if !self.contains(&name) {
                return Err(FlagError::parse(
                    "feature selection",
                    format!("'{raw}' is not an optional feature of this manifest"),
                ));
            }
            picked.push(name);
        }
        picked.sort();
        picked.dedup();
        Ok(FeatureCatalog::from_sorted(picked))
    }
}

impl<'a> IntoIterator for &'a FeatureCatalog {
    type Item = &'a FeatureName;
    type IntoIter = std::slice::Iter<'a, FeatureName>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}
