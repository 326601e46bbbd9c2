//! The gate-validation framework: shared skeleton (C5), factory (C6),
//! applicability engine (C7), and scorer (C8).

pub mod applicability;
pub mod catalog;
pub mod classifiers;
pub mod definition;
pub mod factory;
pub mod scorer;

pub use applicability::is_applicable;
pub use definition::{GateValidator, PatternGateValidator, ValidationContext};
pub use factory::build_validator;
