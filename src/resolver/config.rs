//! Pipeline config loading.
//!
//! YAML and TOML configs deserialize into the same `PipelineConfig`; the
//! resolver never sees which format a document came from.

use crate::catalog::{ComponentCategory, ComponentType};
use crate::error::FlagError;
use serde::Deserialize;
use serde::de::IgnoredAny;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from the file extension. Anything else is rejected
    /// instead of guessed.
    pub fn from_path(path: &Path) -> Result<Self, FlagError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml" | "yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            _ => Err(FlagError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// One source, transform, or sink definition. Only `type` matters here.
#[derive(Clone, Debug, Deserialize)]
pub struct ComponentDef {
    #[serde(rename = "type")]
    pub component_type: ComponentType,
}

/// The parts of a pipeline config that decide which features are needed.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub api: Option<IgnoredAny>,
    #[serde(default)]
    pub enterprise: Option<IgnoredAny>,
    #[serde(default)]
    pub sources: BTreeMap<String, ComponentDef>,
    #[serde(default)]
    pub transforms: BTreeMap<String, ComponentDef>,
    #[serde(default)]
    pub sinks: BTreeMap<String, ComponentDef>,
}

impl PipelineConfig {
    pub fn parse(contents: &str, format: ConfigFormat, origin: &str) -> Result<Self, FlagError> {
        let parsed = match format {
            ConfigFormat::Yaml => {
                // An empty YAML document is null, which serde_yaml will not
                // turn into a struct.
                if contents.trim().is_empty() {
                    return Ok(PipelineConfig::default());
                }
                serde_yaml::from_str(contents).map_err(|err| err.to_string())
            }
            ConfigFormat::Toml => toml::from_str(contents).map_err(|err| err.to_string()),
        };
        parsed.map_err(|message| FlagError::parse(origin, message))
    }

    /// Detect the format from `path`, read it, and parse it.
    pub fn load(path: &Path) -> Result<Self, FlagError> {
        let format = ConfigFormat::from_path(path)?;
        let contents = fs::read_to_string(path).map_err(|err| FlagError::io(path, err))?;
        Self::parse(&contents, format, &path.display().to_string())
    }

    pub fn components(&self, category: ComponentCategory) -> &BTreeMap<String, ComponentDef> {
        match category {
            ComponentCategory::Sources => &self.sources,
            ComponentCategory::Transforms => &self.transforms,
            ComponentCategory::Sinks => &self.sinks,
        }
    }

    /// Top-level keys that are features in their own right, when set.
    pub fn base_features(&self) -> impl Iterator<Item = &'static str> {
        [("api", self.api.is_some()), ("enterprise", self.enterprise.is_some())]
            .into_iter()
            .filter_map(|(name, present)| present.then_some(name))
    }
}
