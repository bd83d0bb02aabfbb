//! Harness configuration: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{HarnessError, Result};

/// Full harness configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[derive(Default)]
pub struct HarnessConfig {
    pub binaries: BinariesConfig,
    pub execution: ExecutionConfig,
    pub report: ReportConfig,
}

/// Locations of the externally built tools the cases drive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BinariesConfig {
    /// Directory holding the profiler and dumper binaries under test.
    pub testbin_dir: PathBuf,
}

impl Default for BinariesConfig {
    fn default() -> Self {
        Self {
            testbin_dir: PathBuf::from("."),
        }
    }
}

/// Knobs governing case execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Watchdog limit for any child process spawned by a case, in seconds.
    pub process_timeout_secs: u64,
    /// Keep per-case output directories instead of deleting them in teardown.
    pub keep_artifacts: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            process_timeout_secs: 60,
            keep_artifacts: false,
        }
    }
}

/// Reporting sinks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReportConfig {
    /// JSONL run-log path. `None` disables the file log.
    pub log_path: Option<PathBuf>,
    /// Colorize console output.
    pub color: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            color: true,
        }
    }
}

impl HarnessConfig {
    /// Default config file location, relative to the invocation directory.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathBuf::from("harness.toml")
    }

    /// Load configuration: file (if present), then env overrides, then validation.
    ///
    /// A missing file is only an error when `path` was given explicitly;
    /// otherwise defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf)
                .map_err(|source| HarnessError::io(&path_buf, source))?;
            toml::from_str::<Self>(&raw)?
        } else if is_explicit_path {
            return Err(HarnessError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Watchdog limit as a [`Duration`].
    #[must_use]
    pub const fn process_timeout(&self) -> Duration {
        Duration::from_secs(self.execution.process_timeout_secs)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        set_env_path("PTH_TESTBIN_DIR", &mut self.binaries.testbin_dir);
        set_env_u64(
            "PTH_PROCESS_TIMEOUT_SECS",
            &mut self.execution.process_timeout_secs,
        )?;
        set_env_bool("PTH_KEEP_ARTIFACTS", &mut self.execution.keep_artifacts)?;
        if let Some(raw) = env_var("PTH_LOG_PATH") {
            self.report.log_path = Some(PathBuf::from(raw));
        }
        set_env_bool("PTH_COLOR", &mut self.report.color)?;
        Ok(())
    }

    /// Check cross-field invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.execution.process_timeout_secs == 0 {
            return Err(HarnessError::InvalidConfig {
                details: "execution.process_timeout_secs must be > 0".to_string(),
            });
        }
        if self.binaries.testbin_dir.as_os_str().is_empty() {
            return Err(HarnessError::InvalidConfig {
                details: "binaries.testbin_dir must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn set_env_path(name: &str, slot: &mut PathBuf) {
    if let Some(raw) = env_var(name) {
        *slot = PathBuf::from(raw);
    }
}

fn set_env_u64(name: &str, slot: &mut u64) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw.parse::<u64>().map_err(|error| HarnessError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })?;
    }
    Ok(())
}

fn set_env_bool(name: &str, slot: &mut bool) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw
            .parse::<bool>()
            .map_err(|error| HarnessError::ConfigParse {
                context: "env",
                details: format!("{name}={raw:?}: {error}"),
            })?;
    }
    Ok(())
}
