//! LLM Enhancement Hook (C10): a narrow, deadline-aware, optional adapter
//! invoked per gate with matches and base recommendations, per spec §4.10.
//! Contract only — no provider implementation, per §1's Non-goals.

use async_trait::async_trait;
use std::time::Duration;

use crate::core::model::{GateKind, Language, Match};

/// The input one `enhance` call receives.
#[derive(Debug, Clone)]
pub struct EnhancementInput {
    pub gate: GateKind,
    pub language: Language,
    pub technologies: crate::io::technology::TechnologyMap,
    pub matches: Vec<Match>,
    pub base_recommendations: Vec<String>,
}

/// Optional augmentation the hook may return. Every field is optional;
/// absence of a field means "use the base analysis unchanged".
#[derive(Debug, Clone, Default)]
pub struct EnhancementResult {
    pub enhanced_quality_score: Option<f64>,
    pub replacement_recommendations: Vec<String>,
    pub extra_details: Vec<String>,
    pub security_insights: Vec<String>,
    pub technology_insights: Vec<String>,
}

/// The hook contract. Implementations MUST be side-effect-free on the core
/// data model — the orchestrator applies whatever is returned, and a
/// failing or slow call degrades to an empty [`EnhancementResult`] rather
/// than failing the scan.
#[async_trait]
pub trait EnhancementHook: Send + Sync {
    /// Called at most once per (gate, language) pair per scan. The caller
    /// is responsible for enforcing the overall per-gate time budget, but
    /// implementations SHOULD still bound their own latency internally.
    async fn enhance(&self, input: EnhancementInput) -> Result<Option<EnhancementResult>, String>;
}

/// The default hook: always returns `None`, indistinguishable from
/// "enhancement absent" per spec §4.10's optionality requirement.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEnhancementHook;

#[async_trait]
impl EnhancementHook for NoopEnhancementHook {
    async fn enhance(&self, _input: EnhancementInput) -> Result<Option<EnhancementResult>, String> {
        Ok(None)
    }
}

/// Wrap any hook with a hard per-call deadline. Exceeding it yields `None`
/// rather than propagating an error, matching "exceeding the budget yields
/// an empty EnhancementResult" in spec §4.10.
pub struct DeadlineBoundedHook<H: EnhancementHook> {
    inner: H,
    budget: Duration,
}

impl<H: EnhancementHook> DeadlineBoundedHook<H> {
    pub fn new(inner: H, budget: Duration) -> Self {
        Self { inner, budget }
    }
}

#[async_trait]
impl<H: EnhancementHook> EnhancementHook for DeadlineBoundedHook<H> {
    async fn enhance(&self, input: EnhancementInput) -> Result<Option<EnhancementResult>, String> {
        match tokio::time::timeout(self.budget, self.inner.enhance(input)).await {
            Ok(result) => result,
            Err(_elapsed) => Ok(None),
        }
    }
}
