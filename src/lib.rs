//! Shared library for the flagcheck binaries.
//!
//! Two independent jobs live here. `resolver` answers "which cargo features
//! does this pipeline config need?". `catalog` + `verify` answer "does every
//! optional feature in this manifest build on its own?". The binaries under
//! `src/bin/` are thin wrappers that parse arguments and environment, call into
//! these modules, and map errors to exit codes.

use anyhow::{Result, bail};
use std::env;
use std::path::{Path, PathBuf};

pub mod catalog;
pub mod error;
pub mod logging;
pub mod resolver;
pub mod verify;

pub use catalog::{
    CatalogFilter, ComponentCategory, ComponentType, FeatureCatalog, FeatureName,
    extract_catalog, load_catalog,
};
pub use error::FlagError;
pub use resolver::{
    ConfigFormat, PipelineConfig, RenameTables, ResolvedFeatureSet, resolve, resolve_path,
};
pub use verify::{
    BuildRunner, BuildTemplate, CommandRunner, RetryPolicy, VerificationReport, VerifySettings,
    verify,
};

const MANIFEST_FILE: &str = "Cargo.toml";

/// Split comma- or whitespace-delimited configuration lists into tokens.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .replace(',', " ")
        .split_whitespace()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Locate the manifest to scrape.
///
/// An explicit path (flag or `FLAGCHECK_MANIFEST`) must exist. Otherwise the
/// search climbs from `start` to the first directory holding a `Cargo.toml`.
pub fn find_manifest(explicit: Option<&Path>, start: &Path) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        bail!("manifest not found at {}", path.display());
    }

    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(MANIFEST_FILE);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !dir.pop() {
            break;
        }
    }

    bail!(
        "Unable to locate {MANIFEST_FILE} above {}. Pass --manifest or set FLAGCHECK_MANIFEST.",
        start.display()
    )
}

/// Read a non-empty environment variable.
pub fn env_value(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn split_list_accepts_commas_and_spaces() {
        assert_eq!(
            split_list("api, sinks-gcp  sources-file,,"),
            vec!["api", "sinks-gcp", "sources-file"]
        );
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn find_manifest_climbs_to_nearest_cargo_toml() {
        let temp = TempDir::new().expect("temp dir");
        let root = temp.path();
        let nested = root.join("src").join("bin");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.join("Cargo.toml"), "[features]\n").unwrap();

        let found = find_manifest(None, &nested).unwrap();
        assert_eq!(found, root.join("Cargo.toml"));
    }

    #[test]
    fn explicit_manifest_must_exist() {
        let temp = TempDir::new().expect("temp dir");
        let missing = temp.path().join("nope.toml");
        let err = find_manifest(Some(&missing), temp.path()).unwrap_err();
        assert!(err.to_string().contains("manifest not found"));
    }
}
