//! Prints the cargo features a pipeline config needs.
//!
//! Takes exactly one argument, a `.yaml`/`.yml`/`.toml` config path, and
//! prints the resolved features as one comma-joined line suitable for
//! `cargo build --no-default-features --features "$(resolve-features cfg.yaml)"`.
//! `FLAGCHECK_RENAME_TABLES` may point at a TOML file that replaces the
//! built-in rename tables.

use anyhow::{Context, Result, anyhow};
use flagcheck::logging::init_logging;
use flagcheck::{RenameTables, env_value, resolve_path};
use std::env;
use std::path::PathBuf;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse()?;
    init_logging("warn")?;

    let tables = match env_value("FLAGCHECK_RENAME_TABLES") {
        Some(path) => RenameTables::from_path(&PathBuf::from(path))
            .context("loading FLAGCHECK_RENAME_TABLES")?,
        None => RenameTables::builtin(),
    };

    let resolved = resolve_path(&cli.config_path, &tables)?;
    println!("{}", resolved.to_feature_list());
    Ok(())
}

struct Cli {
    config_path: PathBuf,
}

impl Cli {
    fn parse() -> Result<Self> {
        let mut positionals = Vec::new();
        for arg in env::args_os().skip(1) {
            let arg_str = arg
                .to_str()
                .ok_or_else(|| anyhow!("invalid UTF-8 in argument"))?;
            match arg_str {
                "--help" | "-h" => usage(0),
                _ => positionals.push(PathBuf::from(arg_str)),
            }
        }

        if positionals.len() != 1 {
            usage(1);
        }

        Ok(Self {
            config_path: positionals.remove(0),
        })
    }
}

fn usage(code: i32) -> ! {
    eprintln!(
        "Usage: resolve-features CONFIG\n\nPrints the comma-separated cargo features needed to run CONFIG (.yaml, .yml, or .toml).\n\nEnvironment:\n  FLAGCHECK_RENAME_TABLES   TOML file replacing the built-in rename tables and denylist.\n  RUST_LOG                  Log filter (default: warn)."
    );
    std::process::exit(code);
}
