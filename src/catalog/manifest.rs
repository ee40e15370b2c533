//! Line-oriented scraping of a cargo manifest's `[features]` table.
//!
//! The scraper does not run a full TOML parse: it walks the section line by
//! line, keeps keys of `name = ...` assignments, and skips the continuation
//! lines of multi-line arrays. Anything that looks like an assignment but does
//! not carry a usable feature name is a hard error so the verifier never runs
//! against a partial catalog.

use crate::catalog::identity::FeatureName;
use crate::catalog::model::{CatalogFilter, FeatureCatalog};
use crate::error::FlagError;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub const FEATURES_SECTION: &str = "features";

/// Extract the filtered, sorted feature catalog from manifest text.
///
/// `origin` names the manifest in error messages (usually its path).
pub fn extract_catalog(
    manifest: &str,
    origin: &str,
    filter: &CatalogFilter,
) -> Result<FeatureCatalog, FlagError> {
    let mut in_section = false;
    let mut saw_section = false;
    let mut names: BTreeSet<FeatureName> = BTreeSet::new();

    for (idx, raw_line) in manifest.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(header) = section_header(line) {
            in_section = header == FEATURES_SECTION;
            saw_section |= in_section;
            continue;
        }

        if !in_section {
            continue;
        }

        let Some((key, _value)) = line.split_once('=') else {
            continue;
        };
        let name = parse_key(key).ok_or_else(|| {
            FlagError::parse(
                origin,
                format!(
                    "line {}: cannot read a feature name from '{}'",
                    idx + 1,
                    raw_line.trim()
                ),
            )
        })?;
        if filter.admits(&name) {
            names.insert(FeatureName(name));
        }
    }

    if !saw_section {
        return Err(FlagError::parse(
            origin,
            format!("no [{FEATURES_SECTION}] section found"),
        ));
    }

    Ok(FeatureCatalog::from_sorted(names.into_iter().collect()))
}

/// Read a manifest from disk and extract its catalog.
pub fn load_catalog(path: &Path, filter: &CatalogFilter) -> Result<FeatureCatalog, FlagError> {
    let contents = fs::read_to_string(path).map_err(|err| FlagError::io(path, err))?;
    extract_catalog(&contents, &path.display().to_string(), filter)
}

/// Returns the table name for `[name]` / `[[name]]` headers.
fn section_header(line: &str) -> Option<&str> {
    if !line.starts_with('[') || line.contains('=') {
        return None;
    }
    // Drop a trailing comment before looking for the closing bracket.
    let line = line.split('#').next().unwrap_or("").trim_end();
    let inner = line.strip_prefix('[')?.strip_suffix(']')?;
    let inner = inner
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(inner);
    Some(inner.trim())
}

fn parse_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| {
            trimmed
                .strip_prefix('\'')
                .and_then(|s| s.strip_suffix('\''))
        })
        .unwrap_or(trimmed);
    if unquoted.is_empty()
        || !unquoted
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+'))
    {
        return None;
    }
    Some(unquoted.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
[package]
name = "pipeline"
version = "0.1.0"

[features]
# The default build.
default = ["api", "sources-file"]
all-integration-tests = ["sources-kafka-integration-tests"]
api = ["dep:async-graphql"]
sources-file = []
sources-prometheus = [
    "dep:prost",
    "prometheus-utils",
]
prometheus-utils = []
"sinks-gcp" = ["dep:goauth"]
sinks-console = []

[dev-dependencies]
criterion = "0.5"
"#;

    fn names(catalog: &FeatureCatalog) -> Vec<&str> {
        catalog.iter().map(FeatureName::as_str).collect()
    }

    #[test]
    fn extracts_sorted_filtered_names() {
        let catalog = extract_catalog(MANIFEST, "Cargo.toml", &CatalogFilter::default()).unwrap();
        assert_eq!(
            names(&catalog),
            vec![
                "api",
                "sinks-console",
                "sinks-gcp",
                "sources-file",
                "sources-prometheus"
            ]
        );
    }

    #[test]
    fn stops_at_next_section() {
        let catalog = extract_catalog(MANIFEST, "Cargo.toml", &CatalogFilter::default()).unwrap();
        assert!(!catalog.contains(&FeatureName::from("criterion")));
        assert!(!catalog.contains(&FeatureName::from("name")));
    }

    #[test]
    fn missing_section_is_an_error() {
        let err = extract_catalog("[package]\nname = \"x\"\n", "Cargo.toml", &CatalogFilter::default())
            .unwrap_err();
        assert!(matches!(err, FlagError::Parse { .. }));
        assert!(err.to_string().contains("no [features] section"));
    }

    #[test]
    fn malformed_key_is_an_error() {
        let manifest = "[features]\nfoo bar = []\n";
        let err = extract_catalog(manifest, "Cargo.toml", &CatalogFilter::default()).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }

    #[test]
    fn empty_section_yields_empty_catalog() {
        let catalog =
            extract_catalog("[features]\n\n[lib]\n", "Cargo.toml", &CatalogFilter::default())
                .unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn repeated_keys_appear_once() {
        let manifest = "[features]\napi = []\nsinks-http = []\n\"api\" = [\"dep:hyper\"]\n";
        let catalog = extract_catalog(manifest, "Cargo.toml", &CatalogFilter::default()).unwrap();
        assert_eq!(names(&catalog), vec!["api", "sinks-http"]);
    }

    #[test]
    fn headers_with_comments_are_recognized() {
        let manifest = "[features] # optional capabilities\nsinks-http = []\n";
        let catalog = extract_catalog(manifest, "Cargo.toml", &CatalogFilter::default()).unwrap();
        assert_eq!(names(&catalog), vec!["sinks-http"]);
    }
}
