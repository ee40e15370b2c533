//! Error kinds shared by the extractor, resolver, and verifier.
//!
//! Binaries wrap these in `anyhow` for reporting; library callers can match on
//! the variant to tell fatal setup problems from aggregated build failures.

use crate::catalog::FeatureName;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlagError {
    /// Malformed manifest or pipeline config document.
    #[error("parse error in {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("unsupported config format for {}: expected .yaml, .yml, or .toml", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("{0}")]
    Usage(String),

    /// A warm-up build failed; nothing else was attempted.
    #[error("baseline build '{label}' failed{}", exit_suffix(*exit_code))]
    BaselineFailure {
        label: String,
        exit_code: Option<i32>,
    },

    /// One or more isolated feature builds failed after exhausting retries.
    #[error("{} feature(s) failed to build in isolation: {}", failed.len(), join_names(failed))]
    BuildFailure { failed: Vec<FeatureName> },

    #[error("failed to start the build worker pool")]
    WorkerPool {
        #[source]
        source: rayon::ThreadPoolBuildError,
    },

    #[error("reading {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FlagError {
    pub(crate) fn parse(origin: impl Into<String>, message: impl Into<String>) -> Self {
        FlagError::Parse {
            origin: origin.into(),
            message: message.into(),
        }
    }

    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        FlagError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn exit_suffix(code: Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {code}"),
        None => String::new(),
    }
}

fn join_names(names: &[FeatureName]) -> String {
    names
        .iter()
        .map(FeatureName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
