//! Feature catalog wiring.
//!
//! The catalog is the list of optional cargo features a manifest declares,
//! minus the sentinels and helper features nobody should build on their own.
//! `manifest` scrapes it from `Cargo.toml`; `identity` holds the name types the
//! resolver shares.

pub mod identity;
pub mod manifest;
pub mod model;

pub use identity::{ComponentCategory, ComponentType, FeatureName};
pub use manifest::{FEATURES_SECTION, extract_catalog, load_catalog};
pub use model::{ALL_INTEGRATION_TESTS, CatalogFilter, FeatureCatalog};
