//! Scorer (C8): per-gate weighting and overall aggregation, ported
//! verbatim in formula from `codegates/core/gate_scorer.py::GateScorer`.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::core::model::{GateKind, GateScore, GateStatus};

/// Per-gate weight table, spec §4.8.
static WEIGHTS: Lazy<HashMap<GateKind, f64>> = Lazy::new(|| {
    use GateKind::*;
    HashMap::from([
        (AvoidLoggingSecrets, 2.0),
        (ErrorLogs, 1.8),
        (StructuredLogs, 1.6),
        (AuditTrail, 1.5),
        (AutomatedTests, 1.4),
        (RetryLogic, 1.3),
        (CircuitBreakers, 1.3),
        (Timeouts, 1.2),
        (HttpCodes, 1.2),
        (CorrelationId, 1.1),
        (LogApiCalls, 1.1),
        (Throttling, 1.0),
        (UiErrors, 1.0),
        (UiErrorTools, 1.0),
        (LogBackgroundJobs, 0.9),
    ])
});

/// Gate weight, per spec §4.8's table.
pub fn weight(gate: GateKind) -> f64 {
    *WEIGHTS.get(&gate).unwrap_or(&1.0)
}

/// Priority classification derived from the weight table, a supplemented
/// feature from `codegates`'s `GateScorer.get_gate_priority`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePriority {
    Critical,
    High,
    Medium,
    Low,
}

impl GatePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatePriority::Critical => "CRITICAL",
            GatePriority::High => "HIGH",
            GatePriority::Medium => "MEDIUM",
            GatePriority::Low => "LOW",
        }
    }
}

/// Priority bucket for `gate`, from its weight (>=1.5 CRITICAL, >=1.2 HIGH,
/// >=1.0 MEDIUM, else LOW).
pub fn priority(gate: GateKind) -> GatePriority {
    let w = weight(gate);
    if w >= 1.5 {
        GatePriority::Critical
    } else if w >= 1.2 {
        GatePriority::High
    } else if w >= 1.0 {
        GatePriority::Medium
    } else {
        GatePriority::Low
    }
}

fn quality_multiplier(quality_score: f64) -> f64 {
    if quality_score >= 90.0 {
        1.0
    } else if quality_score >= 80.0 {
        0.9
    } else if quality_score >= 70.0 {
        0.8
    } else if quality_score >= 60.0 {
        0.6
    } else {
        0.4
    }
}

/// Compute the per-gate final score, spec §4.8:
/// `base = 0.7*coverage + 0.3*quality_score`,
/// `final = min(100, base * weight * quality_multiplier)`.
pub fn final_score(gate: GateKind, coverage: f64, quality_score: f64) -> f64 {
    let base = 0.7 * coverage + 0.3 * quality_score;
    let multiplier = quality_multiplier(quality_score);
    (base * weight(gate) * multiplier).min(100.0)
}

/// Overall score: weighted mean of final scores over gates whose status
/// contributes to scoring (PASS/WARNING/FAIL/FAILED). Returns 0 if none do.
pub fn overall_score(scores: &[GateScore]) -> f64 {
    let scored: Vec<&GateScore> = scores.iter().filter(|s| s.status.is_scored()).collect();
    if scored.is_empty() {
        return 0.0;
    }
    let weight_sum: f64 = scored.iter().map(|s| weight(s.gate)).sum();
    if weight_sum <= 0.0 {
        return 0.0;
    }
    let weighted_sum: f64 = scored.iter().map(|s| s.final_score * weight(s.gate)).sum();
    weighted_sum / weight_sum
}

/// Whether `status` should be classified among pass/warning/fail counts
/// (mirrors [`GateStatus::is_scored`] but named for the aggregation step).
pub fn counts(scores: &[GateScore]) -> (usize, usize, usize) {
    let passed = scores.iter().filter(|s| s.status == GateStatus::Pass).count();
    let warning = scores.iter().filter(|s| s.status == GateStatus::Warning).count();
    let failed = scores
        .iter()
        .filter(|s| matches!(s.status, GateStatus::Fail | GateStatus::Failed))
        .count();
    (passed, warning, failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_score_never_exceeds_100() {
        let score = final_score(GateKind::AvoidLoggingSecrets, 100.0, 100.0);
        assert!(score <= 100.0);
    }

    #[test]
    fn weight_lookup_matches_spec_table() {
        assert_eq!(weight(GateKind::AvoidLoggingSecrets), 2.0);
        assert_eq!(weight(GateKind::LogBackgroundJobs), 0.9);
    }

    #[test]
    fn priority_buckets_follow_weight() {
        assert_eq!(priority(GateKind::AvoidLoggingSecrets), GatePriority::Critical);
        assert_eq!(priority(GateKind::Timeouts), GatePriority::High);
        assert_eq!(priority(GateKind::Throttling), GatePriority::Medium);
        assert_eq!(priority(GateKind::LogBackgroundJobs), GatePriority::Low);
    }

    #[test]
    fn overall_score_excludes_not_applicable_and_unsupported() {
        let make = |gate, status, score| GateScore {
            gate,
            expected: 1,
            found: 1,
            coverage: 100.0,
            quality_score: 100.0,
            final_score: score,
            status,
            details: vec![],
            recommendations: vec![],
            matches: vec![],
        };

        let with_na = vec![
            make(GateKind::StructuredLogs, GateStatus::Pass, 90.0),
            make(GateKind::UiErrors, GateStatus::NotApplicable, 0.0),
        ];
        let without_na = vec![make(GateKind::StructuredLogs, GateStatus::Pass, 90.0)];

        assert_eq!(overall_score(&with_na), overall_score(&without_na));
    }

    #[test]
    fn overall_score_is_zero_with_no_applicable_gates() {
        let make = |gate, status| GateScore {
            gate,
            expected: 0,
            found: 0,
            coverage: 0.0,
            quality_score: 0.0,
            final_score: 0.0,
            status,
            details: vec![],
            recommendations: vec![],
            matches: vec![],
        };
        let scores = vec![make(GateKind::UiErrors, GateStatus::NotApplicable)];
        assert_eq!(overall_score(&scores), 0.0);
    }
}
