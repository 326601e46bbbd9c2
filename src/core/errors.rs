//! Error types for the hard-gate validation engine.
//!
//! The variants mirror the error kinds this engine's error-handling design
//! error-handling design: each kind has a defined propagation policy (fail
//! the scan, downgrade to a detail entry, or skip the affected unit of work)
//! that callers are expected to honor rather than rediscover ad hoc.

use std::io;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HardGateError>;

/// Errors produced by the core engine.
///
/// Propagation policy is documented per-variant below.
#[derive(Error, Debug)]
pub enum HardGateError {
    /// Malformed request or unknown configuration option. The scan is never
    /// created.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Human-readable description.
        message: String,
        /// Offending field, if identifiable.
        field: Option<String>,
    },

    /// The repository acquisition adapter signaled failure. The scan is
    /// marked failed with this detail.
    #[error("repository unavailable: {message}")]
    RepositoryUnavailable {
        /// Adapter-supplied detail.
        message: String,
    },

    /// The repository acquisition adapter signaled an authentication or
    /// authorization failure.
    #[error("access denied: {message}")]
    AccessDenied {
        /// Adapter-supplied detail.
        message: String,
    },

    /// A single file could not be read. Recoverable: the file is skipped and
    /// a detail entry is recorded; the scan continues.
    #[error("failed to read {path}: {source}")]
    FileRead {
        /// Path of the unreadable file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A pattern in a gate's pattern set failed to compile. Recoverable at
    /// gate granularity: that gate returns FAILED, other gates continue.
    #[error("pattern compile error in gate '{gate}': {message}")]
    PatternCompile {
        /// Gate whose pattern set failed to compile.
        gate: String,
        /// Underlying regex error description.
        message: String,
    },

    /// A validator raised an unhandled error. Recoverable at gate
    /// granularity: that gate returns FAILED with final_score = 0.
    #[error("validator error in gate '{gate}' ({language}): {message}")]
    Validator {
        /// Gate that failed.
        gate: String,
        /// Language the validator was running against.
        language: String,
        /// Error description.
        message: String,
    },

    /// A deadline was exceeded. Overall scan deadlines fail unrun gates with
    /// a "timeout" detail; enhancement deadlines fall back silently.
    #[error("timeout: {message}")]
    Timeout {
        /// Description of what timed out.
        message: String,
    },

    /// Generic configuration error (invalid value, not merely unknown key).
    #[error("configuration error: {message}")]
    Config {
        /// Error description.
        message: String,
        /// Configuration field that caused the error.
        field: Option<String>,
    },

    /// Serialization/deserialization failure.
    #[error("serialization error: {message}")]
    Serialization {
        /// Error description.
        message: String,
    },

    /// Unexpected internal error. The scan is marked failed.
    #[error("internal error: {message}")]
    Internal {
        /// Error description.
        message: String,
    },
}

impl HardGateError {
    /// Construct an [`HardGateError::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
        }
    }

    /// Construct an [`HardGateError::InvalidInput`] tagged with the offending field.
    pub fn invalid_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Construct an [`HardGateError::RepositoryUnavailable`].
    pub fn repository_unavailable(message: impl Into<String>) -> Self {
        Self::RepositoryUnavailable {
            message: message.into(),
        }
    }

    /// Construct an [`HardGateError::AccessDenied`].
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied {
            message: message.into(),
        }
    }

    /// Construct an [`HardGateError::FileRead`].
    pub fn file_read(path: impl Into<String>, source: io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Construct an [`HardGateError::PatternCompile`].
    pub fn pattern_compile(gate: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PatternCompile {
            gate: gate.into(),
            message: message.into(),
        }
    }

    /// Construct an [`HardGateError::Validator`].
    pub fn validator(
        gate: impl Into<String>,
        language: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Validator {
            gate: gate.into(),
            language: language.into(),
            message: message.into(),
        }
    }

    /// Construct an [`HardGateError::Timeout`].
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Construct an [`HardGateError::Config`].
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Construct an [`HardGateError::Config`] tagged with the offending field.
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Construct an [`HardGateError::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for error kinds that should fail the entire scan rather than
    /// being recovered at file/gate granularity.
    pub fn is_scan_fatal(&self) -> bool {
        matches!(
            self,
            Self::RepositoryUnavailable { .. } | Self::AccessDenied { .. } | Self::Internal { .. }
        )
    }
}

impl From<io::Error> for HardGateError {
    fn from(err: io::Error) -> Self {
        Self::Internal {
            message: format!("I/O operation failed: {err}"),
        }
    }
}

impl From<serde_json::Error> for HardGateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON error: {err}"),
        }
    }
}

impl From<regex::Error> for HardGateError {
    fn from(err: regex::Error) -> Self {
        Self::PatternCompile {
            gate: "unknown".to_string(),
            message: err.to_string(),
        }
    }
}

/// Result extension trait for attaching human-readable context to an error.
pub trait ResultExt<T> {
    /// Wrap the error (if any) as an [`HardGateError::Internal`] carrying the
    /// given context, preserving the original message.
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| HardGateError::internal(format!("{msg}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_expected_variants() {
        assert!(matches!(
            HardGateError::invalid_input("bad"),
            HardGateError::InvalidInput { .. }
        ));
        assert!(matches!(
            HardGateError::config("bad"),
            HardGateError::Config { .. }
        ));
    }

    #[test]
    fn scan_fatal_classification() {
        assert!(HardGateError::repository_unavailable("x").is_scan_fatal());
        assert!(HardGateError::access_denied("x").is_scan_fatal());
        assert!(HardGateError::internal("x").is_scan_fatal());
        assert!(!HardGateError::timeout("x").is_scan_fatal());
        assert!(!HardGateError::validator("g", "python", "x").is_scan_fatal());
    }

    #[test]
    fn context_wraps_display_errors() {
        let result: std::result::Result<i32, std::num::ParseIntError> = "nope".parse();
        let wrapped = result.context("parsing retry count");
        assert!(wrapped.is_err());
        assert!(wrapped.unwrap_err().to_string().contains("parsing retry count"));
    }
}
