//! Validation Orchestrator (C9): drives the whole pipeline end-to-end,
//! producing a [`ValidationResult`].

use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::config::Settings;
use crate::core::errors::{HardGateError, Result};
use crate::core::model::{
    FileRecord, GateKind, GateResult, GateScore, GateStatus, Language, ValidationResult,
};
use crate::gates::{applicability, factory, scorer};
use crate::io::technology::detect_technologies;
use crate::io::walker::{walk_files, WalkOptions};
use crate::lang::detector::detect_languages;
use crate::llm::{EnhancementHook, EnhancementInput};

/// Run one full validation of `root` against `settings`, honoring
/// `settings.scan_deadline_secs` as an overall wall-clock deadline and
/// `cancellation` as an external stop signal checked between gates.
pub async fn run_validation(
    root: &Path,
    settings: &Settings,
    llm: &dyn EnhancementHook,
    cancellation: &CancellationToken,
) -> Result<ValidationResult> {
    let started = Instant::now();
    let deadline = started + std::time::Duration::from_secs(settings.scan_deadline_secs);

    let languages = if settings.languages.is_empty() {
        detect_languages(root)?.into_iter().map(|d| d.language).collect::<Vec<_>>()
    } else {
        settings.languages.clone()
    };
    let primary_language = languages.first().copied();

    // Scoped per-scan pool: walker and pattern-matcher rayon work for this
    // scan runs inside it rather than on rayon's process-global pool, so
    // `per_scan_workers` actually bounds concurrency per scan.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.per_scan_workers)
        .build()
        .map_err(|e| HardGateError::config(format!("failed to build per-scan worker pool: {e}")))?;

    let walk_options = WalkOptions {
        include_globs: settings.include_globs.clone(),
        exclude_globs: settings.exclude_globs.clone(),
        max_file_size: settings.max_file_size,
        follow_symlinks: settings.follow_symlinks,
        ..WalkOptions::default()
    };
    let files = pool.install(|| walk_files(root, &walk_options))?;
    let total_files = files.len();
    let total_lines: usize = files.iter().map(|f| f.line_count).sum();

    let mut gate_scores = Vec::with_capacity(GateKind::ALL.len());

    for gate in GateKind::ALL {
        if cancellation.is_cancelled() {
            gate_scores.push(timeout_gate_score(gate));
            continue;
        }
        if Instant::now() >= deadline {
            gate_scores.push(timeout_gate_score(gate));
            continue;
        }

        let score = evaluate_gate(gate, root, &languages, &files, settings, llm, deadline, &pool).await;
        gate_scores.push(score);
    }

    let overall = scorer::overall_score(&gate_scores);
    let (passed_count, warning_count, failed_count) = scorer::counts(&gate_scores);

    let critical_issues = synthesize_critical_issues(&gate_scores);
    let recommendations = synthesize_recommendations(&gate_scores);

    info!(
        root = %root.display(),
        overall,
        total_files,
        "validation complete"
    );

    Ok(ValidationResult {
        project_name: root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        root_path: root.to_string_lossy().to_string(),
        primary_language,
        total_files,
        total_lines,
        scan_duration_ms: started.elapsed().as_millis() as u64,
        timestamp: Utc::now(),
        gate_scores,
        overall_score: overall,
        passed_count,
        warning_count,
        failed_count,
        critical_issues,
        recommendations,
    })
}

fn timeout_gate_score(gate: GateKind) -> GateScore {
    GateScore {
        gate,
        expected: 0,
        found: 0,
        coverage: 0.0,
        quality_score: 0.0,
        final_score: 0.0,
        status: GateStatus::Failed,
        details: vec!["timeout".to_string()],
        recommendations: vec![],
        matches: vec![],
    }
}

async fn evaluate_gate(
    gate: GateKind,
    root: &Path,
    languages: &[Language],
    files: &[FileRecord],
    settings: &Settings,
    llm: &dyn EnhancementHook,
    deadline: std::time::Instant,
    pool: &rayon::ThreadPool,
) -> GateScore {
    let primary_language = languages.first().copied();
    let technologies = primary_language
        .map(|lang| detect_technologies(root, lang, files))
        .unwrap_or_default();

    if !applicability::is_applicable(gate, root, files, &technologies) {
        return GateScore {
            gate,
            expected: 0,
            found: 0,
            coverage: 0.0,
            quality_score: 0.0,
            final_score: 0.0,
            status: GateStatus::NotApplicable,
            details: vec![],
            recommendations: vec![],
            matches: vec![],
        };
    }

    if !factory::is_supported_for_any(gate, languages) {
        return GateScore {
            gate,
            expected: 0,
            found: 0,
            coverage: 0.0,
            quality_score: 0.0,
            final_score: 0.0,
            status: GateStatus::Unsupported,
            details: vec![],
            recommendations: vec!["no validator available".to_string()],
            matches: vec![],
        };
    }

    match run_validators_across_languages(gate, root, languages, files, settings, pool).await {
        Ok(aggregated) => {
            let enhanced = maybe_enhance(gate, primary_language, llm, &aggregated, deadline).await;
            finalize_gate_score(gate, aggregated, enhanced)
        }
        Err(e) => {
            warn!(gate = %gate, error = %e, "validator failed");
            GateScore {
                gate,
                expected: 0,
                found: 0,
                coverage: 0.0,
                quality_score: 0.0,
                final_score: 0.0,
                status: GateStatus::Failed,
                details: vec![e.to_string()],
                recommendations: vec![],
                matches: vec![],
            }
        }
    }
}

async fn run_validators_across_languages(
    gate: GateKind,
    root: &Path,
    languages: &[Language],
    files: &[FileRecord],
    settings: &Settings,
    pool: &rayon::ThreadPool,
) -> Result<GateResult> {
    let mut aggregated = GateResult::default();
    let mut quality_sum = 0.0;
    let mut quality_count = 0u32;
    let mut seen_recommendations = std::collections::HashSet::new();

    for language in languages {
        let Some(validator) = factory::build_validator(gate, *language) else {
            continue;
        };
        let ctx = crate::gates::ValidationContext {
            root,
            language: *language,
            files,
            case_sensitive_patterns: settings.case_sensitive_patterns,
        };
        let result = pool.install(|| validator.validate(&ctx))?;

        aggregated.expected += result.expected;
        aggregated.found += result.found;
        quality_sum += result.quality_score;
        quality_count += 1;
        aggregated.details.extend(result.details);
        for rec in result.recommendations {
            if seen_recommendations.insert(rec.clone()) {
                aggregated.recommendations.push(rec);
            }
        }
        for (category, techs) in result.technologies {
            aggregated.technologies.entry(category).or_insert_with(Vec::new).extend(techs);
        }
        aggregated.matches.extend(result.matches);
    }

    aggregated.quality_score = if quality_count > 0 {
        quality_sum / quality_count as f64
    } else {
        0.0
    };

    Ok(aggregated)
}

async fn maybe_enhance(
    gate: GateKind,
    language: Option<Language>,
    llm: &dyn EnhancementHook,
    aggregated: &GateResult,
    deadline: std::time::Instant,
) -> Option<crate::llm::EnhancementResult> {
    if std::time::Instant::now() >= deadline {
        return None;
    }
    if scorer::priority(gate) == scorer::GatePriority::Low && aggregated.matches.len() < 2 {
        return None;
    }
    let input = EnhancementInput {
        gate,
        language: language.unwrap_or(Language::Python),
        technologies: aggregated.technologies.clone(),
        matches: aggregated.matches.clone(),
        base_recommendations: aggregated.recommendations.clone(),
    };
    llm.enhance(input).await.ok().flatten()
}

fn finalize_gate_score(
    gate: GateKind,
    mut aggregated: GateResult,
    enhancement: Option<crate::llm::EnhancementResult>,
) -> GateScore {
    if let Some(enh) = enhancement {
        if let Some(q) = enh.enhanced_quality_score {
            aggregated.quality_score = q;
        }
        if !enh.replacement_recommendations.is_empty() {
            aggregated.recommendations = enh.replacement_recommendations;
        }
        aggregated.details.extend(enh.extra_details);
    }

    let coverage = GateScore::compute_coverage(aggregated.expected, aggregated.found);
    let final_score = scorer::final_score(gate, coverage, aggregated.quality_score);
    let status = GateScore::status_from_final_score(final_score);

    GateScore {
        gate,
        expected: aggregated.expected,
        found: aggregated.found,
        coverage,
        quality_score: aggregated.quality_score,
        final_score,
        status,
        details: aggregated.details,
        recommendations: aggregated.recommendations,
        matches: aggregated.matches,
    }
}

fn synthesize_critical_issues(scores: &[GateScore]) -> Vec<String> {
    let mut issues = Vec::new();
    if let Some(secrets) = scores.iter().find(|s| s.gate == GateKind::AvoidLoggingSecrets) {
        if secrets.found > 0 {
            issues.push(format!(
                "Sensitive data detected in log statements ({} occurrence(s))",
                secrets.found
            ));
        }
    }
    for score in scores {
        if score.status == GateStatus::Failed && score.details.iter().any(|d| d == "timeout") {
            issues.push(format!("{} did not complete before the scan deadline", score.gate));
        }
    }
    issues
}

fn synthesize_recommendations(scores: &[GateScore]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut ordered = Vec::new();
    for score in scores {
        if !score.status.is_scored() {
            continue;
        }
        for rec in &score.recommendations {
            if seen.insert(rec.clone()) {
                ordered.push(rec.clone());
            }
        }
    }
    ordered
}
