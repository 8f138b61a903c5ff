//! Depth-aware splitting of operand lists.
//!
//! A comma cannot be used as a plain delimiter because operands may be
//! nested queries containing commas of their own. The splitter scans the
//! text character by character and only splits on commas encountered
//! outside any parenthesis pair.

use crate::error::{PlanError, Result};
use crate::plan::event::{AtomicEvent, Operator};

/// Split a comma-separated operand string into its top-level operand
/// substrings, each trimmed of surrounding whitespace.
///
/// `"B, AND(C, E, D, F)"` splits into `["B", "AND(C, E, D, F)"]`; the
/// comma inside the nested query is not a delimiter.
pub fn split_operands(text: &str) -> Result<Vec<String>> {
    let chars: Vec<char> = text.chars().collect();
    let mut results: Vec<String> = Vec::new();
    let mut buffer = String::new();
    let mut depth: i64 = 0;

    for (index, &ch) in chars.iter().enumerate() {
        if (ch == ',' || ch == ' ') && buffer.is_empty() {
            continue;
        }

        // A bare primitive code adjoining a delimiter or the end of the
        // input needs no buffering.
        let next = chars.get(index + 1).copied();
        if buffer.is_empty() && AtomicEvent::is_code(ch) && matches!(next, None | Some(',')) {
            results.push(ch.to_string());
            continue;
        }

        match ch {
            ',' if depth == 0 => {
                if !buffer.is_empty() {
                    results.push(buffer.trim().to_string());
                    buffer.clear();
                }
            }
            '(' => {
                depth += 1;
                buffer.push(ch);
            }
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(PlanError::MalformedOperand(text.to_string()));
                }
                buffer.push(ch);
            }
            _ => buffer.push(ch),
        }
    }

    if !buffer.trim().is_empty() {
        results.push(buffer.trim().to_string());
    }

    // Sanity check: every token must be shaped like a primitive code or
    // start with a known operator name followed by an opening parenthesis.
    // Single-character tokens are left for the operand interpreter, which
    // rejects unknown codes with a more specific error.
    for item in &results {
        let is_primitive_shaped = item.chars().count() == 1;
        let is_query = Operator::ALL.iter().any(|operator| {
            item.strip_prefix(operator.name())
                .is_some_and(|rest| rest.starts_with('('))
        });
        if !is_primitive_shaped && !is_query {
            return Err(PlanError::MalformedOperand(item.clone()));
        }
    }

    Ok(results)
}
