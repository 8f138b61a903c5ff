//! Closed enumerations of the evaluation-plan vocabulary: atomic event
//! types, composition operators and worker-node identifiers.
//!
//! All three sets use exact-match dispatch over a fixed token table. The
//! token is the wire form; an unknown token is a parse error, never a
//! best-effort prefix match.

use std::fmt;

use crate::error::{PlanError, Result};

/// An atomic, externally observed event kind with no internal structure,
/// identified by a fixed one-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AtomicEvent {
    A,
    B,
    C,
    D,
    E,
    F,
    J,
}

impl AtomicEvent {
    /// Every atomic event kind, in code order.
    pub const ALL: [AtomicEvent; 7] = [
        AtomicEvent::A,
        AtomicEvent::B,
        AtomicEvent::C,
        AtomicEvent::D,
        AtomicEvent::E,
        AtomicEvent::F,
        AtomicEvent::J,
    ];

    /// The literal one-letter code of this event kind.
    pub fn code(&self) -> &'static str {
        match self {
            AtomicEvent::A => "A",
            AtomicEvent::B => "B",
            AtomicEvent::C => "C",
            AtomicEvent::D => "D",
            AtomicEvent::E => "E",
            AtomicEvent::F => "F",
            AtomicEvent::J => "J",
        }
    }

    /// The pub/sub routing key of this event kind, equal to its code.
    pub fn topic(&self) -> String {
        self.code().to_string()
    }

    /// Exact-match lookup of a token against the closed event set.
    pub fn from_token(token: &str) -> Result<Self> {
        match token.trim() {
            "A" => Ok(AtomicEvent::A),
            "B" => Ok(AtomicEvent::B),
            "C" => Ok(AtomicEvent::C),
            "D" => Ok(AtomicEvent::D),
            "E" => Ok(AtomicEvent::E),
            "F" => Ok(AtomicEvent::F),
            "J" => Ok(AtomicEvent::J),
            other => Err(PlanError::UnknownEventType(other.to_string())),
        }
    }

    /// Whether a single character is one of the atomic event codes.
    pub fn is_code(ch: char) -> bool {
        matches!(ch, 'A' | 'B' | 'C' | 'D' | 'E' | 'F' | 'J')
    }
}

impl fmt::Display for AtomicEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A composition kind applied to an ordered list of operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// All operands occurred, order-independent in evaluation
    And,
    /// Operands occurred in this exact order
    Seq,
}

impl Operator {
    /// Every operator, in declaration order.
    pub const ALL: [Operator; 2] = [Operator::And, Operator::Seq];

    /// The canonical operator name used in statement text.
    pub fn name(&self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Seq => "SEQ",
        }
    }

    /// Exact-match lookup of a token against the closed operator set.
    /// Case-sensitive.
    pub fn from_token(token: &str) -> Result<Self> {
        match token.trim() {
            "AND" => Ok(Operator::And),
            "SEQ" => Ok(Operator::Seq),
            other => Err(PlanError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Highest node identifier accepted by [`NodeId::new`]. The reference
/// plan assigns nodes 0 through 9; the headroom above that lets the plan
/// optimizer mint helper nodes without leaving the valid range.
pub const MAX_NODE_ID: u8 = 15;

/// Identifier of a logical worker unit evaluating statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u8);

impl NodeId {
    /// Build a node identifier, rejecting values above [`MAX_NODE_ID`].
    pub fn new(value: u8) -> Result<Self> {
        if value > MAX_NODE_ID {
            return Err(PlanError::UnknownNode(value.to_string()));
        }
        Ok(NodeId(value))
    }

    /// Parse a node identifier from statement text.
    pub fn from_token(token: &str) -> Result<Self> {
        let value: u8 = token
            .trim()
            .parse()
            .map_err(|_| PlanError::UnknownNode(token.trim().to_string()))?;
        NodeId::new(value)
    }

    /// The raw numeric identifier.
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
