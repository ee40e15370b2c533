use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub const MANIFEST: &str = r#"[package]
name = "pipeline"
version = "0.1.0"
edition = "2021"

[features]
default = ["api", "sources-file"]
all-integration-tests = []
api = []
prometheus-utils = []
sinks-console = []
sinks-gcp = [
    "prometheus-utils",
]
sources-file = []

[dependencies]
"#;

pub fn helper_binary(name: &str) -> PathBuf {
    let path = match name {
        "check-features" => env!("CARGO_BIN_EXE_check-features"),
        "list-features" => env!("CARGO_BIN_EXE_list-features"),
        "resolve-features" => env!("CARGO_BIN_EXE_resolve-features"),
        other => panic!("unknown helper {other}"),
    };
    PathBuf::from(path)
}

pub fn run_command(mut cmd: Command) -> Result<Output> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to run command: {:?}", cmd))?;
    if output.status.success() {
        Ok(output)
    } else {
        bail!(
            "command {:?} failed: status {:?}\nstdout: {}\nstderr: {}",
            cmd,
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    }
}

pub fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}

/// A stand-in for cargo that records every invocation.
///
/// Each call appends its arguments as one line to `invocations.log`. A call
/// exits 101 when its space-padded argument string matches the glob in
/// `FAKE_CARGO_FAIL`. Every feature named in `FAKE_CARGO_FLAKY` fails until it
/// has been built three times.
pub struct FakeCargo {
    pub program: PathBuf,
    pub log: PathBuf,
}

impl FakeCargo {
    pub fn install(dir: &Path) -> Result<Self> {
        let program = dir.join("fake-cargo");
        let log = dir.join("invocations.log");
        let script = format!(
            r#"#!/bin/sh
log="{log}"
echo "$*" >> "$log"
if [ -n "$FAKE_CARGO_FAIL" ]; then
  case " $* " in
    $FAKE_CARGO_FAIL) exit 101 ;;
  esac
fi
for feature in $FAKE_CARGO_FLAKY; do
  case " $* " in
    *" --features $feature --jobs "*)
      seen=$(grep -c -- "--features $feature --jobs" "$log")
      if [ "$seen" -lt 3 ]; then
        exit 1
      fi
      ;;
  esac
done
exit 0
"#,
            log = log.display()
        );
        fs::write(&program, script)?;
        make_executable(&program)?;
        Ok(Self { program, log })
    }

    pub fn invocations(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

pub fn write_manifest(dir: &Path) -> Result<PathBuf> {
    let path = dir.join("Cargo.toml");
    fs::write(&path, MANIFEST)?;
    Ok(path)
}
