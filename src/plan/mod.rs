//! The distributed evaluation plan: vocabulary, query trees, statements
//! and the plan optimizer.
//!
//! This is the parsing core everything else depends on. It is
//! synchronous, stateless between invocations and safe to call from any
//! number of evaluation contexts concurrently.

pub mod event;
pub mod optimizer;
pub mod query;
pub mod splitter;
pub mod statement;
pub mod topic;

pub use event::{AtomicEvent, NodeId, Operator, MAX_NODE_ID};
pub use optimizer::optimize;
pub use query::{parse_operands, Operand, Query};
pub use splitter::split_operands;
pub use statement::{parse_statement_list, Statement, StatementParser};
