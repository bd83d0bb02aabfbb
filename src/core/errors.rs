//! PTH-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Top-level error type for the profiler test harness.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("[PTH-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[PTH-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[PTH-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[PTH-2001] invalid filter pattern {pattern:?}: {details}")]
    InvalidFilter { pattern: String, details: String },

    #[error("[PTH-2002] duplicate case name {full_name:?} in the run view")]
    DuplicateCase { full_name: String },

    #[error("[PTH-2003] test runner is single-shot; build a new runner for a fresh run")]
    RunnerExhausted,

    #[error("[PTH-3001] malformed trace dump in {context}: {details}")]
    MalformedDump {
        context: &'static str,
        details: String,
    },

    #[error("[PTH-3002] trace dump section {section:?} references unknown pid {pid}")]
    UnknownPid { section: &'static str, pid: u32 },

    #[error("[PTH-3003] invalid provider id {value:?}")]
    InvalidProviderId { value: String },

    #[error("[PTH-4001] process {exe:?} failed with exit code {code}")]
    ProcessFailed { exe: String, code: i32 },

    #[error("[PTH-4002] process {exe:?} timed out after {limit:?}")]
    ProcessTimedOut { exe: String, limit: Duration },

    #[error("[PTH-5001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[PTH-5900] runtime failure: {details}")]
    Runtime { details: String },
}

impl HarnessError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "PTH-1001",
            Self::MissingConfig { .. } => "PTH-1002",
            Self::ConfigParse { .. } => "PTH-1003",
            Self::InvalidFilter { .. } => "PTH-2001",
            Self::DuplicateCase { .. } => "PTH-2002",
            Self::RunnerExhausted => "PTH-2003",
            Self::MalformedDump { .. } => "PTH-3001",
            Self::UnknownPid { .. } => "PTH-3002",
            Self::InvalidProviderId { .. } => "PTH-3003",
            Self::ProcessFailed { .. } => "PTH-4001",
            Self::ProcessTimedOut { .. } => "PTH-4002",
            Self::Io { .. } => "PTH-5001",
            Self::Runtime { .. } => "PTH-5900",
        }
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for HarnessError {
    fn from(value: serde_json::Error) -> Self {
        Self::MalformedDump {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for HarnessError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_errors() -> Vec<HarnessError> {
        vec![
            HarnessError::InvalidConfig {
                details: String::new(),
            },
            HarnessError::MissingConfig {
                path: PathBuf::new(),
            },
            HarnessError::ConfigParse {
                context: "",
                details: String::new(),
            },
            HarnessError::InvalidFilter {
                pattern: String::new(),
                details: String::new(),
            },
            HarnessError::DuplicateCase {
                full_name: String::new(),
            },
            HarnessError::RunnerExhausted,
            HarnessError::MalformedDump {
                context: "",
                details: String::new(),
            },
            HarnessError::UnknownPid {
                section: "",
                pid: 0,
            },
            HarnessError::InvalidProviderId {
                value: String::new(),
            },
            HarnessError::ProcessFailed {
                exe: String::new(),
                code: 1,
            },
            HarnessError::ProcessTimedOut {
                exe: String::new(),
                limit: Duration::from_secs(1),
            },
            HarnessError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            },
            HarnessError::Runtime {
                details: String::new(),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let errors = sample_errors();
        let codes: Vec<&str> = errors.iter().map(HarnessError::code).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
    }

    #[test]
    fn error_codes_have_pth_prefix() {
        for err in sample_errors() {
            assert!(
                err.code().starts_with("PTH-"),
                "code {} must start with PTH-",
                err.code()
            );
        }
    }

    #[test]
    fn error_display_includes_code() {
        let err = HarnessError::InvalidConfig {
            details: "bad value".to_string(),
        };
        let msg = err.to_string();
        assert!(
            msg.contains("PTH-1001"),
            "display should contain error code: {msg}"
        );
        assert!(
            msg.contains("bad value"),
            "display should contain details: {msg}"
        );
    }

    #[test]
    fn timeout_is_distinct_from_nonzero_exit() {
        let timed_out = HarnessError::ProcessTimedOut {
            exe: "profiler.exe".to_string(),
            limit: Duration::from_secs(30),
        };
        let failed = HarnessError::ProcessFailed {
            exe: "profiler.exe".to_string(),
            code: 2,
        };
        assert_ne!(timed_out.code(), failed.code());
        assert!(timed_out.to_string().contains("timed out"));
        assert!(failed.to_string().contains("exit code"));
    }

    #[test]
    fn io_convenience_constructor() {
        let err = HarnessError::io(
            "/tmp/trace.etl",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.code(), "PTH-5001");
        assert!(err.to_string().contains("/tmp/trace.etl"));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: HarnessError = json_err.into();
        assert_eq!(err.code(), "PTH-3001");
    }

    #[test]
    fn from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= invalid").unwrap_err();
        let err: HarnessError = toml_err.into();
        assert_eq!(err.code(), "PTH-1003");
    }
}
