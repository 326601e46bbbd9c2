//! Core data model: the value types shared by every stage of the pipeline.
//!
//! All types here are plain data — constructed in one place, published
//! immutably, and never mutated after creation. This mirrors the "Match
//! metadata as a single value type" guidance: no dynamic dictionaries, enum
//! tags wherever a string tag would otherwise be used.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A language this engine has native gate support for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    Python,
    Javascript,
    Typescript,
    Csharp,
    Dotnet,
}

impl Language {
    /// All known languages, in a stable, deterministic order.
    pub const ALL: [Language; 6] = [
        Language::Java,
        Language::Python,
        Language::Javascript,
        Language::Typescript,
        Language::Csharp,
        Language::Dotnet,
    ];

    /// Lowercase name, as used in configuration and API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::Python => "python",
            Language::Javascript => "javascript",
            Language::Typescript => "typescript",
            Language::Csharp => "csharp",
            Language::Dotnet => "dotnet",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = crate::core::errors::HardGateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "java" => Ok(Language::Java),
            "python" => Ok(Language::Python),
            "javascript" | "js" => Ok(Language::Javascript),
            "typescript" | "ts" => Ok(Language::Typescript),
            "csharp" | "c#" | "cs" => Ok(Language::Csharp),
            "dotnet" => Ok(Language::Dotnet),
            other => Err(crate::core::errors::HardGateError::invalid_field(
                format!("unknown language '{other}'"),
                "languages",
            )),
        }
    }
}

/// One of the fifteen fixed engineering-practice gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    StructuredLogs,
    AvoidLoggingSecrets,
    AuditTrail,
    CorrelationId,
    LogApiCalls,
    LogBackgroundJobs,
    UiErrors,
    RetryLogic,
    Timeouts,
    Throttling,
    CircuitBreakers,
    ErrorLogs,
    HttpCodes,
    UiErrorTools,
    AutomatedTests,
}

impl GateKind {
    /// All fifteen gates, in the order ValidationResult.gate_scores is emitted.
    pub const ALL: [GateKind; 15] = [
        GateKind::StructuredLogs,
        GateKind::AvoidLoggingSecrets,
        GateKind::AuditTrail,
        GateKind::CorrelationId,
        GateKind::LogApiCalls,
        GateKind::LogBackgroundJobs,
        GateKind::UiErrors,
        GateKind::RetryLogic,
        GateKind::Timeouts,
        GateKind::Throttling,
        GateKind::CircuitBreakers,
        GateKind::ErrorLogs,
        GateKind::HttpCodes,
        GateKind::UiErrorTools,
        GateKind::AutomatedTests,
    ];

    /// Snake_case name, as used in configuration and API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            GateKind::StructuredLogs => "structured_logs",
            GateKind::AvoidLoggingSecrets => "avoid_logging_secrets",
            GateKind::AuditTrail => "audit_trail",
            GateKind::CorrelationId => "correlation_id",
            GateKind::LogApiCalls => "log_api_calls",
            GateKind::LogBackgroundJobs => "log_background_jobs",
            GateKind::UiErrors => "ui_errors",
            GateKind::RetryLogic => "retry_logic",
            GateKind::Timeouts => "timeouts",
            GateKind::Throttling => "throttling",
            GateKind::CircuitBreakers => "circuit_breakers",
            GateKind::ErrorLogs => "error_logs",
            GateKind::HttpCodes => "http_codes",
            GateKind::UiErrorTools => "ui_error_tools",
            GateKind::AutomatedTests => "automated_tests",
        }
    }

    /// True for the one gate whose expected count is definitionally zero:
    /// any finding is itself a violation.
    pub fn is_negative_gate(&self) -> bool {
        matches!(self, GateKind::AvoidLoggingSecrets)
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source file discovered by the file walker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the scan root.
    pub relative_path: String,
    /// Language tag, if the extension maps to a known language.
    pub language: Option<Language>,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Number of lines (newline count + 1 for a non-empty file).
    pub line_count: usize,
}

/// Severity bucket attached to a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Priority integer this severity correlates monotonically with (1..10).
    pub fn default_priority(&self) -> u8 {
        match self {
            Severity::Low => 3,
            Severity::Medium => 6,
            Severity::High => 9,
        }
    }
}

/// Enclosing-function context for a match, heuristically derived by scanning
/// backward from the match line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FunctionContext {
    pub name: Option<String>,
    pub declaration_line: Option<usize>,
    pub signature: Option<String>,
    pub distance_lines: Option<usize>,
}

/// One hit of a gate's pattern set against a source line, with the full
/// metadata set this engine requires downstream for scoring,
/// reporting, and LLM enhancement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub absolute_path: String,
    pub relative_path: String,
    pub file_name: String,
    pub extension: String,
    pub file_size: u64,
    pub modified_time: Option<DateTime<Utc>>,

    pub line_number: usize,
    pub column_start: usize,
    pub column_end: usize,
    pub matched_text: String,
    pub line_text: String,
    pub context_lines: Vec<String>,
    pub context_start_line: usize,
    pub context_end_line: usize,

    pub pattern: String,
    pub pattern_type: String,
    pub category: String,
    pub language: Language,
    pub gate: GateKind,

    pub severity: Severity,
    pub priority: u8,

    pub function_context: FunctionContext,

    pub line_length: usize,
    pub leading_whitespace: usize,
    pub is_comment: bool,
    pub is_string_literal: bool,

    pub suggested_fix: Option<String>,
    pub documentation_link: Option<String>,
}

impl Match {
    /// Enforces `column_start <= column_end` and that the context range
    /// encloses the match line, as required by the data model invariants.
    pub fn is_well_formed(&self) -> bool {
        self.column_start <= self.column_end
            && self.context_start_line <= self.line_number
            && self.line_number <= self.context_end_line
    }
}

/// Outcome of one gate validator run against one language, before
/// cross-language aggregation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateResult {
    pub expected: u32,
    pub found: u32,
    pub quality_score: f64,
    pub details: Vec<String>,
    pub recommendations: Vec<String>,
    pub technologies: HashMap<String, Vec<String>>,
    pub matches: Vec<Match>,
}

/// Status of a gate after scoring and applicability/support resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateStatus {
    Pass,
    Warning,
    Fail,
    Failed,
    NotApplicable,
    Unsupported,
}

impl GateStatus {
    /// Whether this status contributes to the overall score mean.
    pub fn is_scored(&self) -> bool {
        matches!(
            self,
            GateStatus::Pass | GateStatus::Warning | GateStatus::Fail | GateStatus::Failed
        )
    }
}

impl fmt::Display for GateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GateStatus::Pass => "PASS",
            GateStatus::Warning => "WARNING",
            GateStatus::Fail => "FAIL",
            GateStatus::Failed => "FAILED",
            GateStatus::NotApplicable => "NOT_APPLICABLE",
            GateStatus::Unsupported => "UNSUPPORTED",
        };
        f.write_str(s)
    }
}

/// Per-gate outcome after aggregating across every selected language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateScore {
    pub gate: GateKind,
    pub expected: u32,
    pub found: u32,
    pub coverage: f64,
    pub quality_score: f64,
    pub final_score: f64,
    pub status: GateStatus,
    pub details: Vec<String>,
    pub recommendations: Vec<String>,
    pub matches: Vec<Match>,
}

impl GateScore {
    /// Coverage rule from the data model: negative-gate perfection when
    /// nothing was expected and nothing found, penalty-per-violation when
    /// nothing was expected but violations were found, ratio otherwise.
    pub fn compute_coverage(expected: u32, found: u32) -> f64 {
        if expected == 0 && found == 0 {
            100.0
        } else if expected == 0 {
            (100.0 - 10.0 * found as f64).max(0.0)
        } else {
            (100.0 * found as f64 / expected as f64).min(100.0)
        }
    }

    /// Status rule from the data model, given a precomputed final_score.
    /// NOT_APPLICABLE/UNSUPPORTED/FAILED are decided by the caller before
    /// this is reached; this only covers the scored threshold ladder.
    pub fn status_from_final_score(final_score: f64) -> GateStatus {
        if final_score >= 80.0 {
            GateStatus::Pass
        } else if final_score >= 60.0 {
            GateStatus::Warning
        } else {
            GateStatus::Fail
        }
    }
}

/// One complete end-to-end evaluation of a repository revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub project_name: String,
    pub root_path: String,
    pub primary_language: Option<Language>,
    pub total_files: usize,
    pub total_lines: usize,
    pub scan_duration_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub gate_scores: Vec<GateScore>,
    pub overall_score: f64,
    pub passed_count: usize,
    pub warning_count: usize,
    pub failed_count: usize,
    pub critical_issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Lifecycle status of a submitted scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Running => "running",
            ScanStatus::Completed => "completed",
            ScanStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// The input a scan was submitted with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanInput {
    pub repository_url: String,
    pub branch: Option<String>,
    pub threshold: Option<u8>,
}

/// A scan's full lifecycle record, exclusively owned by the Scan Service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    pub scan_id: String,
    pub submitted_at: DateTime<Utc>,
    pub status: ScanStatus,
    pub message: String,
    pub progress: Option<f32>,
    pub input: ScanInput,
    pub result: Option<ValidationResult>,
    pub error: Option<String>,
}

impl ScanRecord {
    pub fn new(scan_id: String, input: ScanInput, submitted_at: DateTime<Utc>) -> Self {
        Self {
            scan_id,
            submitted_at,
            status: ScanStatus::Pending,
            message: "queued".to_string(),
            progress: None,
            input,
            result: None,
            error: None,
        }
    }
}
