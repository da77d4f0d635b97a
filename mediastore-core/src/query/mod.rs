//! Content queries: compilation to store filters and in-memory trimming
//!
//! This module provides:
//! - Attribute and constraint model
//! - Query compiler producing nested `$elemMatch` filters
//! - Single-entity checker and result trimmer for nested collections
//! - Query-parameter parsing

pub mod attribute;
pub mod checker;
pub mod compiler;
pub mod concerns;
pub mod constraint;
pub mod params;
pub mod path;
pub mod trimmer;

pub use attribute::{Attribute, EntityKind, ValueKind};
pub use compiler::QueryCompiler;
pub use constraint::{Constraint, ConstraintValues, ContentQuery, Operator, Strength};
pub use params::QueryParamParser;
pub use trimmer::ResultTrimmer;

/// Query construction and compilation errors
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Query matches nothing and cannot be compiled")]
    MatchesNothing,

    #[error("Operator {operator} is not supported for {kind:?} attribute {attribute}")]
    UnsupportedOperator {
        attribute: &'static str,
        operator: Operator,
        kind: ValueKind,
    },

    #[error("Attribute {attribute} targets {kind}, which has no document path")]
    UnsupportedEntity {
        attribute: &'static str,
        kind: EntityKind,
    },

    #[error("No value given for {0}")]
    MissingValue(&'static str),

    #[error("Attribute {attribute} takes {expected:?} values, got {found:?}")]
    ValueKindMismatch {
        attribute: &'static str,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Invalid value {value} for {attribute}: {reason}")]
    InvalidValue {
        attribute: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
