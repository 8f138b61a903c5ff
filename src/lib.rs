//! # Cascade
//!
//! Cascade distributes complex-event-processing queries over a set of
//! worker nodes that communicate through a publish/subscribe message
//! bus. A textual evaluation plan assigns each pattern query to one or
//! more nodes; parsing a statement yields the query tree to compute,
//! the inputs to subscribe to and the nodes that evaluate it. Topic
//! names derived from the query's canonical form are the routing keys
//! that wire subscriptions to advertisements across the cluster.
//!
//! ## Example
//!
//! ```rust
//! use cascade::plan::StatementParser;
//!
//! let statement = StatementParser::new("SELECT SEQ(J, A) FROM J, A ON {4}")
//!     .parse()
//!     .unwrap();
//! assert_eq!(statement.query.topic(), "SEQ(J-A)");
//! assert_eq!(statement.input_topics(), vec!["A", "J"]);
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_name_repetitions)]

/// Evaluation-plan core: splitter, query trees, statements, topics
pub mod plan;

/// Message-bus transports
pub mod bus;

/// Embedded CEP engine boundary
pub mod engine;

/// Worker-node runtime
pub mod node;

/// Bootstrap configuration
pub mod config;

pub mod error;

// Re-export commonly used types
pub use error::{PlanError, Result};
pub use plan::{AtomicEvent, NodeId, Operand, Operator, Query, Statement, StatementParser};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlanError::InvalidQuery("AND".to_string());
        assert_eq!(format!("{}", err), "invalid query: 'AND'");
    }
}
