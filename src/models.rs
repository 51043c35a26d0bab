use thiserror::Error;

pub mod filter;
pub mod project;
pub mod store;
pub mod todo;

/// Returned when a command line or persisted literal does not name a known variant
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid {kind} '{value}', expected one of: {}", .expected.join(", "))]
pub struct ParseValueError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static [&'static str],
}
