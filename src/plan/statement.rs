//! Statements of the distributed evaluation plan and their parser.
//!
//! A statement binds a query to compute and advertise, the inputs it
//! needs to subscribe to, and the worker nodes that evaluate it:
//!
//! ```text
//! SELECT AND(E, SEQ(J, A)) FROM E, SEQ(J, A) ON {5, 9}
//! ```

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{PlanError, Result};
use crate::plan::event::NodeId;
use crate::plan::query::{parse_operands, Operand, Query};

/// A top-level unit of work: a query, the inputs it needs, and the nodes
/// that evaluate it.
///
/// Two statements are equal iff their query topics and sorted input
/// topics are equal; the node assignment is excluded. Two statements
/// computing the same thing over the same inputs on different nodes are
/// the same statement.
#[derive(Debug, Clone)]
pub struct Statement {
    pub nodes: Vec<NodeId>,
    pub query: Query,
    pub inputs: Vec<Operand>,
}

impl Statement {
    /// Build a statement, validating that at least one node is assigned
    /// and that the declared inputs cover the query's dependencies.
    pub fn new(nodes: Vec<NodeId>, query: Query, inputs: Vec<Operand>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(PlanError::InvalidStatement(format!(
                "no target nodes for query '{}'",
                query
            )));
        }

        let statement = Statement { nodes, query, inputs };
        statement.check_input_coverage()?;
        Ok(statement)
    }

    /// Every atomic event the query depends on must be reachable from
    /// some declared input. Inputs need not mirror the query's operand
    /// structure; a composite input covers all of its leaves.
    fn check_input_coverage(&self) -> Result<()> {
        let mut provided = std::collections::BTreeSet::new();
        for input in &self.inputs {
            match input {
                Operand::Atomic(event) => {
                    provided.insert(*event);
                }
                Operand::Composite(query) => {
                    provided.extend(query.atomic_leaves());
                }
            }
        }

        for needed in self.query.atomic_leaves() {
            if !provided.contains(&needed) {
                return Err(PlanError::UncoveredInput(needed.topic()));
            }
        }
        Ok(())
    }

    /// The sorted topics of the declared inputs. Sorting makes the
    /// derived subscription list independent of declaration order.
    pub fn input_topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.inputs.iter().map(|input| input.topic()).collect();
        topics.sort();
        topics
    }
}

impl PartialEq for Statement {
    fn eq(&self, other: &Self) -> bool {
        self.query.topic() == other.query.topic() && self.input_topics() == other.input_topics()
    }
}

impl Eq for Statement {}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inputs: Vec<String> = self.inputs.iter().map(|input| input.to_string()).collect();
        let nodes: Vec<String> = self.nodes.iter().map(|node| node.to_string()).collect();
        write!(
            f,
            "SELECT {} FROM {} ON {{{}}}",
            self.query,
            inputs.join(", "),
            nodes.join(", ")
        )
    }
}

/// Only the literal keyword anchors delimit the three segments; the
/// query and input segments may themselves contain commas and nested
/// parentheses.
fn statement_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^SELECT (.+) FROM (.+) ON \{(.+)\}$").expect("statement pattern is valid")
    })
}

/// Parser for one textual statement of the evaluation plan.
#[derive(Debug, Clone)]
pub struct StatementParser {
    statement: String,
}

impl StatementParser {
    pub fn new(statement: impl Into<String>) -> Self {
        StatementParser { statement: statement.into() }
    }

    /// Parse the statement text into a [`Statement`].
    ///
    /// Any parse error is raised at the point of detection; no partial
    /// statement is returned.
    pub fn parse(&self) -> Result<Statement> {
        let text = self.statement.trim();
        if text.is_empty() {
            return Err(PlanError::EmptyStatement);
        }

        let captures = statement_regex()
            .captures(text)
            .ok_or_else(|| PlanError::InvalidStatement(text.to_string()))?;

        let query: Query = captures[1].parse()?;
        let inputs = parse_operands(&captures[2])?;
        let nodes = captures[3]
            .split(',')
            .map(NodeId::from_token)
            .collect::<Result<Vec<_>>>()?;

        Statement::new(nodes, query, inputs)
    }
}

/// Parse a `|`-joined list of statement texts, as handed to a node
/// through its environment.
pub fn parse_statement_list(joined: &str) -> Result<Vec<Statement>> {
    joined
        .split('|')
        .filter(|text| !text.trim().is_empty())
        .map(|text| StatementParser::new(text).parse())
        .collect()
}
