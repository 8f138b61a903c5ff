//! A self-contained pattern matcher.
//!
//! Good enough for integration tests and broker-less runs: a
//! conjunction fires once every expected input has been seen, a
//! sequence fires once they have been seen in declaration order.
//! Matching state resets after each firing.

use tracing::debug;

use crate::plan::{Operator, Statement};

use super::{CepEngine, EngineError};

struct PatternState {
    output: String,
    operator: Operator,
    expected: Vec<String>,
    seen: Vec<bool>,
    position: usize,
}

impl PatternState {
    fn from_statement(statement: &Statement) -> Self {
        PatternState {
            output: statement.query.topic(),
            operator: statement.query.operator,
            expected: statement.inputs.iter().map(|input| input.topic()).collect(),
            seen: vec![false; statement.inputs.len()],
            position: 0,
        }
    }

    fn reset(&mut self) {
        self.seen.iter_mut().for_each(|flag| *flag = false);
        self.position = 0;
    }

    /// Advance on one named event; returns true when the pattern fires.
    fn advance(&mut self, name: &str) -> bool {
        match self.operator {
            Operator::And => {
                for (index, expected) in self.expected.iter().enumerate() {
                    if expected.as_str() == name {
                        self.seen[index] = true;
                    }
                }
                if self.seen.iter().all(|flag| *flag) {
                    self.reset();
                    return true;
                }
                false
            }
            Operator::Seq => {
                if self
                    .expected
                    .get(self.position)
                    .is_some_and(|next| next.as_str() == name)
                {
                    self.position += 1;
                } else if self
                    .expected
                    .first()
                    .is_some_and(|first| first.as_str() == name)
                {
                    // A mismatch restarts the sequence; the event itself
                    // may still open a new attempt.
                    self.position = 1;
                } else {
                    self.position = 0;
                }
                if self.position == self.expected.len() {
                    self.reset();
                    return true;
                }
                false
            }
        }
    }
}

/// In-process [`CepEngine`] matching over each statement's input topics.
#[derive(Default)]
pub struct NaiveEngine {
    patterns: Vec<PatternState>,
    outputs: Vec<String>,
}

impl NaiveEngine {
    pub fn new() -> Self {
        NaiveEngine::default()
    }
}

impl CepEngine for NaiveEngine {
    fn deploy(&mut self, statements: &[Statement]) -> Result<(), EngineError> {
        for statement in statements {
            if statement.inputs.is_empty() {
                return Err(EngineError::Deploy(format!(
                    "statement '{}' has no inputs",
                    statement
                )));
            }
        }
        self.patterns = statements.iter().map(PatternState::from_statement).collect();
        self.outputs.clear();
        Ok(())
    }

    fn send_event(&mut self, name: &str) {
        for pattern in &mut self.patterns {
            if pattern.advance(name) {
                debug!(output = %pattern.output, "pattern fired");
                self.outputs.push(pattern.output.clone());
            }
        }
    }

    fn drain_outputs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outputs)
    }

    fn shutdown(&mut self) {
        self.patterns.clear();
        self.outputs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::StatementParser;

    fn engine_with(statement_text: &str) -> NaiveEngine {
        let statement = StatementParser::new(statement_text).parse().unwrap();
        let mut engine = NaiveEngine::new();
        engine.deploy(&[statement]).unwrap();
        engine
    }

    #[test]
    fn conjunction_fires_on_full_set_in_any_order() {
        let mut engine = engine_with("SELECT AND(C, E, D, F) FROM C, E, D, F ON {2, 4}");
        for name in ["F", "C", "D"] {
            engine.send_event(name);
            assert!(engine.drain_outputs().is_empty());
        }
        engine.send_event("E");
        assert_eq!(engine.drain_outputs(), vec!["AND(C-E-D-F)".to_string()]);
    }

    #[test]
    fn sequence_requires_declaration_order() {
        let mut engine = engine_with("SELECT SEQ(J, A) FROM J, A ON {4}");
        engine.send_event("A");
        engine.send_event("J");
        assert!(engine.drain_outputs().is_empty());
        engine.send_event("A");
        assert_eq!(engine.drain_outputs(), vec!["SEQ(J-A)".to_string()]);
    }

    #[test]
    fn sequence_restart_on_first_element() {
        let mut engine = engine_with("SELECT SEQ(J, A) FROM J, A ON {4}");
        engine.send_event("J");
        engine.send_event("J");
        engine.send_event("A");
        assert_eq!(engine.drain_outputs(), vec!["SEQ(J-A)".to_string()]);
    }

    #[test]
    fn composite_inputs_match_on_their_topic() {
        let mut engine = engine_with("SELECT AND(E, SEQ(J, A)) FROM E, SEQ(J, A) ON {9}");
        engine.send_event("E");
        engine.send_event("SEQ(J-A)");
        assert_eq!(engine.drain_outputs(), vec!["AND(E-SEQ(J-A))".to_string()]);
    }

    #[test]
    fn state_resets_after_firing() {
        let mut engine = engine_with("SELECT SEQ(J, A) FROM J, A ON {4}");
        for _ in 0..2 {
            engine.send_event("J");
            engine.send_event("A");
            assert_eq!(engine.drain_outputs().len(), 1);
        }
    }
}
