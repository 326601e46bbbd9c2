//! Pattern Matcher (C3): for a set of file extensions and regex patterns,
//! produce [`Match`] records carrying full location, context, and
//! function-heuristic metadata.
//!
//! Grounded on `codegates/core/gate_validators/base.py::_search_files_for_patterns`,
//! extended with the richer metadata spec §3 mandates (context window,
//! function context, comment/string-literal heuristics).

use std::path::Path;

use rayon::prelude::*;
use regex::RegexBuilder;
use tracing::warn;

use crate::core::errors::{HardGateError, Result};
use crate::core::model::{FunctionContext, GateKind, Language, Match, Severity};
use crate::io::walker::{walk_files, WalkOptions};

const CONTEXT_WINDOW: usize = 3;

/// One pattern in a gate's pattern set, with the metadata a validator
/// assigns it before matching.
#[derive(Debug, Clone)]
pub struct PatternSpec {
    pub pattern: String,
    pub pattern_type: String,
    pub category: String,
    pub severity: Severity,
}

/// Parameters for one matcher invocation.
#[derive(Debug, Clone)]
pub struct MatchOptions {
    pub extensions: Vec<String>,
    pub case_sensitive: bool,
}

fn function_decl_regex(language: Language) -> &'static str {
    match language {
        Language::Python => r"^\s*(?:async\s+)?def\s+(\w+)\s*\(",
        Language::Java | Language::Csharp | Language::Dotnet => {
            r"^\s*(?:public|private|protected|internal|static|\s)*[\w<>\[\],\s]+\s+(\w+)\s*\([^;]*\)\s*\{?\s*$"
        }
        Language::Javascript | Language::Typescript => {
            r"^\s*(?:export\s+)?(?:async\s+)?function\s+(\w+)\s*\(|^\s*const\s+(\w+)\s*=\s*(?:async\s*)?\("
        }
    }
}

fn comment_prefix(language: Language) -> &'static str {
    match language {
        Language::Python => "#",
        _ => "//",
    }
}

fn find_enclosing_function(lines: &[&str], match_line_idx: usize, language: Language) -> FunctionContext {
    let Ok(re) = regex::Regex::new(function_decl_regex(language)) else {
        return FunctionContext::default();
    };
    for (offset, idx) in (0..=match_line_idx).rev().enumerate() {
        if let Some(caps) = re.captures(lines[idx]) {
            let name = caps
                .iter()
                .skip(1)
                .find_map(|g| g.map(|m| m.as_str().to_string()));
            return FunctionContext {
                name,
                declaration_line: Some(idx + 1),
                signature: Some(lines[idx].trim().to_string()),
                distance_lines: Some(offset),
            };
        }
        if offset > 200 {
            break;
        }
    }
    FunctionContext::default()
}

fn looks_like_comment(line: &str, language: Language) -> bool {
    line.trim_start().starts_with(comment_prefix(language))
}

fn looks_like_string_literal(trimmed: &str) -> bool {
    (trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() > 1)
        || (trimmed.starts_with('\'') && trimmed.ends_with('\'') && trimmed.len() > 1)
        || trimmed.contains("\"\"\"")
}

/// Run `patterns` over every file under `root` matching `options.extensions`,
/// tagging results with `gate`. Returns one [`Match`] per (file, line,
/// pattern) hit.
///
/// A pattern compile error is reported via [`HardGateError::PatternCompile`]
/// and aborts the whole call (the caller, a gate validator, turns this into
/// a FAILED GateResult for that gate only — other gates are unaffected).
/// An unreadable file is skipped with a warning; it does not fail the call.
pub fn find_matches(
    root: &Path,
    options: &MatchOptions,
    patterns: &[PatternSpec],
    gate: GateKind,
) -> Result<Vec<Match>> {
    let compiled: Vec<(regex::Regex, &PatternSpec)> = patterns
        .iter()
        .map(|spec| {
            RegexBuilder::new(&spec.pattern)
                .case_insensitive(!options.case_sensitive)
                .build()
                .map(|re| (re, spec))
                .map_err(|e| HardGateError::pattern_compile(gate.as_str(), e.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    let ext_set: std::collections::HashSet<&str> = options.extensions.iter().map(|s| s.as_str()).collect();
    let walk_options = WalkOptions {
        include_globs: options
            .extensions
            .iter()
            .map(|ext| format!("*.{}", ext.trim_start_matches('.')))
            .collect(),
        ..WalkOptions::default()
    };
    let files = walk_files(root, &walk_options)?;

    let matches: Vec<Match> = files
        .par_iter()
        .filter(|file| {
            let ext = Path::new(&file.relative_path)
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            ext_set.is_empty() || ext_set.contains(ext.as_str())
        })
        .flat_map(|file| {
            let absolute = root.join(&file.relative_path);
            let content = match std::fs::read(&absolute) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    warn!(path = %file.relative_path, error = %e, "failed to read file for pattern matching");
                    return Vec::new();
                }
            };
            let lines: Vec<&str> = content.lines().collect();
            let ext = Path::new(&file.relative_path)
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            let file_name = Path::new(&file.relative_path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let metadata = std::fs::metadata(&absolute).ok();
            let modified = metadata
                .as_ref()
                .and_then(|m| m.modified().ok())
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .and_then(|d| chrono::DateTime::from_timestamp(d.as_secs() as i64, 0));

            let mut file_matches = Vec::new();
            for (line_idx, line) in lines.iter().enumerate() {
                for (re, spec) in &compiled {
                    for m in re.find_iter(line) {
                        let context_start = line_idx.saturating_sub(CONTEXT_WINDOW);
                        let context_end = (line_idx + CONTEXT_WINDOW).min(lines.len().saturating_sub(1));
                        let context_lines: Vec<String> =
                            lines[context_start..=context_end].iter().map(|s| s.to_string()).collect();
                        let trimmed = line.trim();
                        let function_context =
                            file.language.map(|lang| find_enclosing_function(&lines, line_idx, lang)).unwrap_or_default();

                        file_matches.push(Match {
                            absolute_path: absolute.to_string_lossy().to_string(),
                            relative_path: file.relative_path.clone(),
                            file_name: file_name.clone(),
                            extension: ext.clone(),
                            file_size: file.size_bytes,
                            modified_time: modified,
                            line_number: line_idx + 1,
                            column_start: m.start() + 1,
                            column_end: m.end(),
                            matched_text: m.as_str().to_string(),
                            line_text: line.to_string(),
                            context_lines,
                            context_start_line: context_start + 1,
                            context_end_line: context_end + 1,
                            pattern: spec.pattern.clone(),
                            pattern_type: spec.pattern_type.clone(),
                            category: spec.category.clone(),
                            language: file.language.unwrap_or(Language::Python),
                            gate,
                            severity: spec.severity,
                            priority: spec.severity.default_priority(),
                            function_context,
                            line_length: line.len(),
                            leading_whitespace: line.len() - line.trim_start().len(),
                            is_comment: file.language.map(|l| looks_like_comment(line, l)).unwrap_or(false),
                            is_string_literal: looks_like_string_literal(trimmed),
                            suggested_fix: None,
                            documentation_link: None,
                        });
                    }
                }
            }
            file_matches
        })
        .collect();

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn finds_matches_with_well_formed_metadata() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("app.py"),
            "def handler():\n    logger.info(\"password=%s\" % pw)\n",
        )
        .unwrap();

        let options = MatchOptions {
            extensions: vec!["py".to_string()],
            case_sensitive: false,
        };
        let patterns = vec![PatternSpec {
            pattern: r"password".to_string(),
            pattern_type: "secret".to_string(),
            category: "credentials".to_string(),
            severity: Severity::High,
        }];

        let matches = find_matches(dir.path(), &options, &patterns, GateKind::AvoidLoggingSecrets).unwrap();
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert!(m.is_well_formed());
        assert_eq!(m.line_number, 2);
        assert_eq!(m.function_context.name.as_deref(), Some("handler"));
    }

    #[test]
    fn bad_pattern_is_rejected_for_whole_call() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.py"), "x = 1\n").unwrap();

        let options = MatchOptions {
            extensions: vec!["py".to_string()],
            case_sensitive: false,
        };
        let patterns = vec![PatternSpec {
            pattern: r"(unclosed".to_string(),
            pattern_type: "bad".to_string(),
            category: "bad".to_string(),
            severity: Severity::Low,
        }];

        let result = find_matches(dir.path(), &options, &patterns, GateKind::StructuredLogs);
        assert!(result.is_err());
    }

    #[test]
    fn unreadable_file_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ok.py"), "logger.info(\"hi\")\n").unwrap();

        let options = MatchOptions {
            extensions: vec!["py".to_string()],
            case_sensitive: false,
        };
        let patterns = vec![PatternSpec {
            pattern: "logger".to_string(),
            pattern_type: "log".to_string(),
            category: "logging".to_string(),
            severity: Severity::Low,
        }];
        let matches = find_matches(dir.path(), &options, &patterns, GateKind::StructuredLogs).unwrap();
        assert_eq!(matches.len(), 1);
    }
}
