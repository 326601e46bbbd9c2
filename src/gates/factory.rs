//! Gate Validator Factory (C6): resolve a validator for a (gate, language)
//! pair, or report "unsupported".
//!
//! Grounded on `codegates/core/gate_validators/factory.py`'s static
//! `(GateType, Language) -> validator_class` table. That table never maps
//! `Language.DOTNET` for any gate, and maps `ui_errors`/`ui_error_tools`
//! only for JavaScript/TypeScript; `gates::catalog::gate_patterns`
//! reproduces that asymmetry, so the factory here is a thin, static
//! dispatch over it rather than a second hand-maintained table.

use crate::core::model::{GateKind, Language};
use crate::gates::definition::{GateValidator, PatternGateValidator};

/// Resolve a validator for `(gate, language)`. Returns `None` when no
/// validator exists for that pair — the orchestrator turns that into an
/// UNSUPPORTED [`crate::core::model::GateScore`].
pub fn build_validator(gate: GateKind, language: Language) -> Option<Box<dyn GateValidator>> {
    PatternGateValidator::build(gate, language).map(|v| Box::new(v) as Box<dyn GateValidator>)
}

/// True if at least one of `languages` has a validator for `gate`. Used by
/// the orchestrator to decide UNSUPPORTED vs. running the subset of
/// languages that are actually supported.
pub fn is_supported_for_any(gate: GateKind, languages: &[Language]) -> bool {
    languages.iter().any(|lang| build_validator(gate, *lang).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotnet_is_unsupported_for_every_gate() {
        for gate in GateKind::ALL {
            assert!(build_validator(gate, Language::Dotnet).is_none());
        }
    }

    #[test]
    fn csharp_has_no_ui_errors_validator() {
        assert!(build_validator(GateKind::UiErrors, Language::Csharp).is_none());
        assert!(!is_supported_for_any(GateKind::UiErrors, &[Language::Csharp]));
    }

    #[test]
    fn python_has_a_structured_logs_validator() {
        assert!(build_validator(GateKind::StructuredLogs, Language::Python).is_some());
    }
}
