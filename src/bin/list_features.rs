//! Prints the optional features a manifest declares, one per line.
//!
//! The list is what `check-features` would build: sorted, without `default`,
//! `all-integration-tests`, or `*-utils` helpers. Handy for feeding an
//! external parallel driver.

use anyhow::{Result, anyhow};
use flagcheck::FlagError;
use flagcheck::logging::init_logging;
use flagcheck::{CatalogFilter, env_value, find_manifest, load_catalog};
use std::env;
use std::path::PathBuf;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        if let Some(FlagError::Usage(_)) = err.downcast_ref::<FlagError>() {
            usage(1);
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse()?;
    init_logging("warn")?;

    let explicit = cli
        .manifest
        .or_else(|| env_value("FLAGCHECK_MANIFEST").map(PathBuf::from));
    let manifest = find_manifest(explicit.as_deref(), &env::current_dir()?)?;
    let catalog = load_catalog(&manifest, &CatalogFilter::default())?;
    for feature in &catalog {
        println!("{feature}");
    }
    Ok(())
}

struct Cli {
    manifest: Option<PathBuf>,
}

impl Cli {
    fn parse() -> Result<Self> {
        let mut args = env::args_os().skip(1);
        let mut manifest = None;

        while let Some(arg) = args.next() {
            let arg_str = arg
                .to_str()
                .ok_or_else(|| anyhow!("invalid UTF-8 in argument"))?;
            match arg_str {
                "--manifest" => {
                    let value = args
                        .next()
                        .ok_or_else(|| usage_error("--manifest requires a value"))?;
                    manifest = Some(PathBuf::from(value));
                }
                "--help" | "-h" => usage(0),
                other => return Err(usage_error(format!("unknown argument: {other}"))),
            }
        }

        Ok(Self { manifest })
    }
}

fn usage_error(message: impl Into<String>) -> anyhow::Error {
    FlagError::Usage(message.into()).into()
}

fn usage(code: i32) -> ! {
    eprintln!(
        "Usage: list-features [--manifest PATH]\n\nOptions:\n  --manifest PATH   Cargo.toml to read (or set FLAGCHECK_MANIFEST; default: nearest Cargo.toml).\n  --help            Show this help text."
    );
    std::process::exit(code);
}
