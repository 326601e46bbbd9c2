//! Typed scan configuration (spec §6.4) plus a layered loader: defaults,
//! then an optional TOML file, then environment overrides prefixed
//! `HARDGATE_`. Unknown keys are rejected at deserialization time rather
//! than silently ignored, matching the fail-fast requirement.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{HardGateError, Result};
use crate::core::model::Language;

/// Everything the orchestrator and Scan Service need to run a scan.
///
/// `#[serde(deny_unknown_fields)]` makes an unrecognized option a
/// deserialization error, which `Settings::from_layered` turns into
/// [`HardGateError::InvalidInput`] at submit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Settings {
    /// Scan root. Empty means "not yet bound to a filesystem path" (e.g.
    /// while only a repository URL has been submitted).
    pub root_path: PathBuf,

    /// Explicit language override; empty means autodetect via the language
    /// detector.
    pub languages: Vec<Language>,

    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,

    /// Files larger than this are skipped by the file walker.
    pub max_file_size: u64,

    pub follow_symlinks: bool,

    /// Consumer-side pass/fail thresholds; the core never enforces these
    /// itself, it only carries them through to callers.
    pub min_coverage_threshold: u8,
    pub min_quality_threshold: u8,

    /// Overall wall-clock deadline for one scan, in seconds.
    pub scan_deadline_secs: u64,
    /// Per-gate LLM enhancement budget, in seconds.
    pub llm_deadline_secs: u64,

    /// Scan Service worker pool size.
    pub max_concurrent_scans: usize,
    /// Inner per-scan walker/matcher pool size.
    pub per_scan_workers: usize,

    pub case_sensitive_patterns: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_path: PathBuf::new(),
            languages: Vec::new(),
            include_globs: Vec::new(),
            exclude_globs: Vec::new(),
            max_file_size: 1_048_576,
            follow_symlinks: false,
            min_coverage_threshold: 70,
            min_quality_threshold: 60,
            scan_deadline_secs: 180,
            llm_deadline_secs: 30,
            max_concurrent_scans: 4,
            per_scan_workers: 8,
            case_sensitive_patterns: false,
        }
    }
}

impl Settings {
    /// Load defaults, then layer an optional TOML file, then environment
    /// variables prefixed `HARDGATE_` (double-underscore nested, e.g.
    /// `HARDGATE_MAX_CONCURRENT_SCANS=8`). Fails fast on any key the
    /// `Settings` shape does not recognize.
    pub fn from_layered(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?);

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("HARDGATE")
                .separator("__")
                .try_parsing(true),
        );

        let built = builder
            .build()
            .map_err(|e| HardGateError::config(format!("failed to assemble configuration: {e}")))?;

        built
            .try_deserialize()
            .map_err(|e| HardGateError::config(format!("invalid or unknown configuration key: {e}")))
    }

    /// Validate cross-field invariants not expressible via serde alone.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_scans == 0 {
            return Err(HardGateError::config_field(
                "max_concurrent_scans must be >= 1",
                "max_concurrent_scans",
            ));
        }
        if self.per_scan_workers == 0 {
            return Err(HardGateError::config_field(
                "per_scan_workers must be >= 1",
                "per_scan_workers",
            ));
        }
        if self.min_coverage_threshold > 100 {
            return Err(HardGateError::config_field(
                "min_coverage_threshold must be 0..=100",
                "min_coverage_threshold",
            ));
        }
        if self.min_quality_threshold > 100 {
            return Err(HardGateError::config_field(
                "min_quality_threshold must be 0..=100",
                "min_quality_threshold",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_worker_pools() {
        let mut settings = Settings::default();
        settings.max_concurrent_scans = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn layered_load_with_no_file_returns_defaults() {
        let settings = Settings::from_layered(None).expect("defaults should always load");
        assert_eq!(settings.max_concurrent_scans, 4);
        assert_eq!(settings.scan_deadline_secs, 180);
    }
}
