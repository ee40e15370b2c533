//! Proves every optional feature of a manifest builds on its own.
//!
//! Responsibilities:
//! - scrape the `[features]` catalog (optionally narrowed by `--features`)
//! - run the three baseline builds, stopping at the first failure
//! - fan out one `--no-default-features --features <name> --jobs 1` build per
//!   feature on a bounded pool, retrying failures
//! - print a summary (or the JSON report) and exit non-zero on any failure

use anyhow::{Context, Result, anyhow};
use flagcheck::FlagError;
use flagcheck::logging::init_logging;
use flagcheck::verify::{self, BuildTemplate, CommandRunner, RetryPolicy, VerifySettings};
use flagcheck::{CatalogFilter, env_value, find_manifest, load_catalog, split_list};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::info;

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
    init_logging("info")?;

    let explicit = cli
        .manifest
        .clone()
        .or_else(|| env_value("FLAGCHECK_MANIFEST").map(PathBuf::from));
    let manifest = find_manifest(explicit.as_deref(), &env::current_dir()?)?;
    let mut catalog = load_catalog(&manifest, &CatalogFilter::default())?;

    let requested = cli
        .features
        .clone()
        .or_else(|| env_value("FLAGCHECK_FEATURES"))
        .map(|raw| split_list(&raw))
        .unwrap_or_default();
    if !requested.is_empty() {
        catalog = catalog.select(&requested)?;
    }

    let mut template = BuildTemplate {
        manifest_path: Some(manifest.clone()),
        ..BuildTemplate::default()
    };
    if let Some(args) = cli.build_args.clone() {
        template.args = args;
    }

    let settings = VerifySettings {
        concurrency: resolve_number(cli.jobs.as_deref(), "FLAGCHECK_JOBS")?
            .map(|n| NonZeroUsize::new(n).ok_or_else(|| anyhow!("--jobs must be at least 1")))
            .transpose()?
            .unwrap_or_else(verify::default_concurrency),
        retry: resolve_number(cli.retries.as_deref(), "FLAGCHECK_RETRIES")?
            .map(|n| RetryPolicy {
                retries: u32::try_from(n).unwrap_or(u32::MAX),
            })
            .unwrap_or_default(),
    };

    if cli.dry_run {
        print_dry_run(&verify::plan(&catalog, &template), settings);
        return Ok(());
    }

    info!(
        manifest = %manifest.display(),
        features = catalog.len(),
        "checking features"
    );

    let mut runner = CommandRunner::new();
    if let Some(dir) = cli.log_dir.clone() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating log dir {}", dir.display()))?;
        runner = runner.with_log_dir(dir);
    }
    let report = verify::verify(&catalog, &template, settings, &runner)?;

    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print_summary(&report);
    }

    report.into_result()?;
    Ok(())
}

fn print_dry_run(plan: &verify::VerificationPlan, settings: VerifySettings) {
    println!("check-features (dry-run)");
    println!(
        "concurrency: {}  retries: {}",
        settings.concurrency, settings.retry.retries
    );
    println!("baselines:");
    for (_, spec) in &plan.baselines {
        println!("  {spec}");
    }
    println!("features:");
    for task in &plan.tasks {
        println!("  {}", task.spec);
    }
}

fn print_summary(report: &verify::VerificationReport) {
    if let verify::BaselineStatus::Failed { baseline, .. } = &report.baseline {
        eprintln!("check-features: baseline {} failed", baseline.label());
        return;
    }
    for outcome in report.outcomes.values() {
        let status = if outcome.passed { "ok" } else { "FAILED" };
        let mut line = format!(
            "{status:>6}  {}  (attempts: {})",
            outcome.feature, outcome.attempts
        );
        if let Some(log) = &outcome.log_path {
            line.push_str(&format!("  log: {}", log.display()));
        }
        eprintln!("{line}");
    }
    eprintln!(
        "check-features: {} passed, {} failed",
        report.passed,
        report.failed.len()
    );
}

/// CLI value first, then the environment variable, else `None`.
fn resolve_number(cli_value: Option<&str>, env_name: &str) -> Result<Option<usize>> {
    let raw = match cli_value {
        Some(value) => value.to_string(),
        None => match env_value(env_name) {
            Some(value) => value,
            None => return Ok(None),
        },
    };
    raw.trim()
        .parse::<usize>()
        .map(Some)
        .map_err(|_| anyhow!("expected a non-negative integer, got '{raw}'"))
}

struct Cli {
    manifest: Option<PathBuf>,
    jobs: Option<String>,
    retries: Option<String>,
    features: Option<String>,
    log_dir: Option<PathBuf>,
    json: bool,
    dry_run: bool,
    build_args: Option<Vec<OsString>>,
}

impl Cli {
    fn parse() -> Result<Self> {
        let mut args = env::args_os().skip(1);
        let mut cli = Cli {
            manifest: None,
            jobs: None,
            retries: None,
            features: None,
            log_dir: None,
            json: false,
            dry_run: false,
            build_args: None,
        };

        while let Some(arg) = args.next() {
            let arg_str = arg
                .to_str()
                .ok_or_else(|| anyhow!("invalid UTF-8 in argument"))?;
            match arg_str {
                "--manifest" => {
                    cli.manifest = Some(PathBuf::from(next_value("--manifest", &mut args)?))
                }
                "--jobs" | "-j" => cli.jobs = Some(next_value("--jobs", &mut args)?),
                "--retries" => cli.retries = Some(next_value("--retries", &mut args)?),
                "--features" => cli.features = Some(next_value("--features", &mut args)?),
                "--log-dir" => {
                    cli.log_dir = Some(PathBuf::from(next_value("--log-dir", &mut args)?))
                }
                "--json" => cli.json = true,
                "--dry-run" => cli.dry_run = true,
                "--help" | "-h" => usage(0),
                "--" => {
                    let rest: Vec<OsString> = args.by_ref().collect();
                    if rest.is_empty() {
                        return Err(usage_error("-- must be followed by build arguments"));
                    }
                    cli.build_args = Some(rest);
                }
                other => return Err(usage_error(format!("unknown argument: {other}"))),
            }
        }

        Ok(cli)
    }
}

fn next_value(flag: &str, args: &mut impl Iterator<Item = OsString>) -> Result<String> {
    let value = args
        .next()
        .ok_or_else(|| usage_error(format!("{flag} requires a value")))?
        .into_string()
        .map_err(|_| anyhow!("{flag} must be valid UTF-8"))?;
    if value.is_empty() {
        return Err(usage_error(format!("{flag} must not be empty")));
    }
    Ok(value)
}

fn usage_error(message: impl Into<String>) -> anyhow::Error {
    FlagError::Usage(message.into()).into()
}

fn usage(code: i32) -> ! {
    eprintln!(
        "Usage: check-features [options] [-- BUILD_ARGS...]\n\nOptions:\n  --manifest PATH     Cargo.toml to check (or FLAGCHECK_MANIFEST; default: nearest Cargo.toml).\n  --jobs, -j N        Feature builds to run at once (or FLAGCHECK_JOBS; default: CPU count).\n  --retries N         Extra attempts per failing feature (or FLAGCHECK_RETRIES; default: 2).\n  --features LIST     Only check these features, comma or space separated (or FLAGCHECK_FEATURES).\n  --log-dir PATH      Write each build's output to PATH/<label>.log.\n  --json              Print the verification report as JSON on stdout.\n  --dry-run           Print the builds that would run and exit.\n  --help              Show this help text.\n\nBUILD_ARGS replace the default 'check --tests'. The program is $CARGO or 'cargo'."
    );
    std::process::exit(code);
}
