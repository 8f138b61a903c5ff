//! The recursively-composable query tree and its text parser.
//!
//! A query is an operator applied to an ordered list of operands, each
//! operand either an atomic event or a nested query. Parsing the same
//! text always yields a structurally identical tree; rendering a tree
//! and parsing it back is the identity.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{PlanError, Result};
use crate::plan::event::{AtomicEvent, Operator};
use crate::plan::splitter::split_operands;
use crate::plan::topic;

/// One operand of a query: an atomic event or a nested sub-query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    /// A primitive event kind, subscribed to directly
    Atomic(AtomicEvent),
    /// A nested query whose result some node produces and advertises
    Composite(Query),
}

impl Operand {
    /// The pub/sub routing key of this operand.
    pub fn topic(&self) -> String {
        match self {
            Operand::Atomic(event) => event.topic(),
            Operand::Composite(query) => query.topic(),
        }
    }

    /// Interpret an operand substring as either a nested query or an
    /// atomic event. Anything containing a parenthesis is dispatched to
    /// the query parser; everything else must be an exact primitive code.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.contains('(') {
            return trimmed.parse::<Query>().map(Operand::Composite);
        }
        AtomicEvent::from_token(trimmed).map(Operand::Atomic)
    }

    fn collect_leaves(&self, leaves: &mut BTreeSet<AtomicEvent>) {
        match self {
            Operand::Atomic(event) => {
                leaves.insert(*event);
            }
            Operand::Composite(query) => {
                for operand in &query.operands {
                    operand.collect_leaves(leaves);
                }
            }
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Atomic(event) => write!(f, "{}", event),
            Operand::Composite(query) => write!(f, "{}", query),
        }
    }
}

/// A node in the query tree: an operator applied to at least one operand.
///
/// Equality is structural and order-sensitive: two queries are equal iff
/// their operators are equal and their operand sequences are equal
/// element-wise. `AND(A, B)` and `AND(B, A)` are distinct values and
/// carry distinct topics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    pub operator: Operator,
    pub operands: Vec<Operand>,
}

impl Query {
    /// Build a query, rejecting an empty operand list.
    pub fn new(operator: Operator, operands: Vec<Operand>) -> Result<Self> {
        if operands.is_empty() {
            return Err(PlanError::InvalidQuery(format!("{}()", operator)));
        }
        Ok(Query { operator, operands })
    }

    /// The routing key derived from the canonical string form, used for
    /// pub/sub subscription and advertisement. Identical structure always
    /// yields the identical topic.
    pub fn topic(&self) -> String {
        topic::sanitize(&self.to_string())
    }

    /// The set of atomic events reachable anywhere in this tree.
    pub fn atomic_leaves(&self) -> BTreeSet<AtomicEvent> {
        let mut leaves = BTreeSet::new();
        for operand in &self.operands {
            operand.collect_leaves(&mut leaves);
        }
        leaves
    }

    /// Whether `operand` appears anywhere in this tree, at any depth.
    pub fn contains(&self, operand: &Operand) -> bool {
        self.operands.iter().any(|candidate| {
            candidate == operand
                || matches!(candidate, Operand::Composite(sub) if sub.contains(operand))
        })
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.operands.iter().map(|op| op.to_string()).collect();
        write!(f, "{}({})", self.operator, rendered.join(", "))
    }
}

/// Anchored at both ends so the greedy inner capture runs to the final
/// closing parenthesis rather than the first one.
fn query_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^([A-Za-z]+)\((.*)\)$").expect("query pattern is valid")
    })
}

impl FromStr for Query {
    type Err = PlanError;

    /// Parse text of the form `OPERATOR(operand, operand, ...)` into a
    /// query tree, recursing into nested parenthesized operands.
    fn from_str(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let captures = query_regex()
            .captures(trimmed)
            .ok_or_else(|| PlanError::InvalidQuery(trimmed.to_string()))?;

        let operator = Operator::from_token(&captures[1])?;
        let operands = split_operands(&captures[2])?
            .iter()
            .map(|item| Operand::parse(item))
            .collect::<Result<Vec<_>>>()?;

        Query::new(operator, operands)
    }
}

/// Parse a comma-separated operand list (the `FROM` segment of a
/// statement) into operands, each a primitive code or a nested query.
pub fn parse_operands(text: &str) -> Result<Vec<Operand>> {
    split_operands(text)?
        .iter()
        .map(|item| Operand::parse(item))
        .collect()
}
