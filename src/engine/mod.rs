//! CEP engine boundary.
//!
//! The engine that actually matches temporal patterns is an opaque
//! collaborator. This module defines the seam the node runtime drives:
//! deploy statements, feed named input events in, drain named composite
//! outputs back out.

pub mod naive;
pub mod pattern;

pub use naive::NaiveEngine;

use crate::plan::Statement;

/// Error types for engine deployment.
#[derive(Debug)]
pub enum EngineError {
    Deploy(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Deploy(msg) => write!(f, "Deploy error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

/// The pattern-matching runtime a worker node embeds.
///
/// Events are exchanged by name only: inputs arrive under their topic
/// name, and a fired pattern is reported as the topic of the query it
/// computes. The schema is a single string attribute.
pub trait CepEngine: Send {
    /// Replace the deployed program with one compiled from `statements`.
    fn deploy(&mut self, statements: &[Statement]) -> Result<(), EngineError>;

    /// Feed one named input event into the running program.
    fn send_event(&mut self, name: &str);

    /// Take the names of every pattern that fired since the last drain.
    fn drain_outputs(&mut self) -> Vec<String>;

    /// Tear the runtime down.
    fn shutdown(&mut self);
}
