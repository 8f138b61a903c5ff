//! Error types for evaluation-plan parsing

use thiserror::Error;

/// Result type alias for plan parsing operations
pub type Result<T> = std::result::Result<T, PlanError>;

/// Errors raised while parsing a distributed evaluation plan.
///
/// All variants are fatal to the single parse call that raised them and
/// propagate uncaught to the caller of the top-level entry point; no
/// partial statement is ever returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// Statement text is empty or whitespace-only
    #[error("empty statement")]
    EmptyStatement,

    /// Missing one of the `SELECT`/`FROM`/`ON {...}` anchors
    #[error("invalid statement: '{0}'")]
    InvalidStatement(String),

    /// Text does not match `OPERATOR(...)` with balanced parentheses
    #[error("invalid query: '{0}'")]
    InvalidQuery(String),

    /// Operator name outside the closed enumerated set
    #[error("unknown operator: '{0}'")]
    UnknownOperator(String),

    /// Operand is neither a known primitive code nor a parseable nested query
    #[error("unknown event type: '{0}'")]
    UnknownEventType(String),

    /// Node identifier outside the valid range
    #[error("unknown node: '{0}'")]
    UnknownNode(String),

    /// Splitter produced a token matching neither a primitive code nor a
    /// recognized operator prefix
    #[error("malformed operand: '{0}'")]
    MalformedOperand(String),

    /// The query needs an atomic event that no declared input provides
    #[error("query depends on '{0}' which no input provides")]
    UncoveredInput(String),
}
