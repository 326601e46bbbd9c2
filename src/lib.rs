//! `hardgate_core`: a multi-language static-analysis engine that evaluates
//! a source repository against the fifteen "hard gate" engineering
//! practices (structured logging, secret-in-log avoidance, retry logic,
//! circuit breakers, timeouts, correlation identifiers, automated tests,
//! and others) and produces a weighted, per-gate and overall score with
//! structured recommendations.
//!
//! The module layout mirrors the component list: [`lang`] and [`io`] are
//! the leaf-level detectors (language classification, file walking,
//! pattern matching, technology detection); [`gates`] is the validator
//! framework built on top of them; [`core`] ties it together into the
//! [`core::orchestrator::run_validation`] pipeline; [`scan`] wraps that
//! pipeline in an asynchronous, concurrency-bounded service; [`http`]
//! exposes that service over the `/api/v1` surface; [`adapters`] and
//! [`llm`] are the narrow trait contracts for the collaborators this
//! crate treats as external (repository acquisition, report rendering,
//! LLM enhancement).

pub mod adapters;
pub mod core;
pub mod gates;
pub mod http;
pub mod io;
pub mod lang;
pub mod llm;
pub mod scan;

pub use core::errors::{HardGateError, Result};
pub use core::model::*;
