use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a cargo feature flag (e.g. `sources-file`).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureName(pub String);

impl FeatureName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FeatureName {
    fn from(value: &str) -> Self {
        FeatureName(value.to_string())
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value of a pipeline component's `type` field.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentType(pub String);

impl ComponentType {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ComponentType {
    fn from(value: &str) -> Self {
        ComponentType(value.to_string())
    }
}

/// The three component sections of a pipeline config.
///
/// The string form doubles as the config key and as the feature-name prefix,
/// so `Sources` + `file` becomes `sources-file`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ComponentCategory {
    Sources,
    Transforms,
    Sinks,
}

impl ComponentCategory {
    pub const ALL: [ComponentCategory; 3] = [
        ComponentCategory::Sources,
        ComponentCategory::Transforms,
        ComponentCategory::Sinks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentCategory::Sources => "sources",
            ComponentCategory::Transforms => "transforms",
            ComponentCategory::Sinks => "sinks",
        }
    }

    /// Build the feature flag for a (possibly renamed) component suffix.
    pub fn feature_for(&self, suffix: &str) -> FeatureName {
        FeatureName(format!("{}-{suffix}", self.as_str()))
    }
}
