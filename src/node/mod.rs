//! Worker-node runtime: one node per concurrent unit, one bus
//! connection per node, a cooperative round-robin over its statements.

pub mod worker;

pub use worker::{NodeControl, NodeError, NodeHandle, WorkerNode};
