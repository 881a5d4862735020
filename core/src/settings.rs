//! Harness settings, loaded from `qjbench.toml`.
//!
//! Every key is optional; anything missing falls back to the layout the
//! build manifest produces.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "qjbench.toml";
pub const CONFIG_ENV: &str = "QJBENCH_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub manifest: ManifestSettings,
    pub tests: TestSettings,
    pub benchmarks: BenchmarkSettings,
    pub process: ProcessSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestSettings {
    pub path: PathBuf,
}

impl Default for ManifestSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("build.ninja"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestSettings {
    pub fixture_dir: PathBuf,
    pub pass_fixtures: u32,
    pub fail_fixtures: u32,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            fixture_dir: PathBuf::from("tests/json_checker_tests"),
            pass_fixtures: 3,
            fail_fixtures: 33,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchmarkSettings {
    /// Root that scenario inputs are resolved against.
    pub data_dir: PathBuf,
    pub preload_module: PathBuf,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("benchmark"),
            preload_module: PathBuf::from(format!("./{}", crate::matrix::MEMORY_REPORTER)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessSettings {
    /// Per-invocation limit; unset means wait forever.
    pub timeout_secs: Option<u64>,
}

impl ProcessSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Settings {
    pub fn from_toml(src: &str) -> Result<Self> {
        toml::from_str(src).context("parse settings")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let src = fs::read_to_string(path).with_context(|| format!("read settings file {}", path.display()))?;
        Self::from_toml(&src).with_context(|| format!("invalid settings in {}", path.display()))
    }

    /// Explicit path wins and must exist; otherwise `qjbench.toml` in `dir` is
    /// used when present, else defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "loading settings");
            return Self::from_file(&candidate);
        }
        Ok(Self::default())
    }
}
