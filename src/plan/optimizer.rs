//! Dependency optimization over a whole evaluation plan.
//!
//! The optimizer rewrites statements so that every composite operand of
//! a query is produced and advertised by some node, letting the owning
//! node subscribe to the composite result instead of re-deriving it from
//! primitive events. It is a pure transformation: input statements are
//! never mutated, a fresh plan is returned.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::plan::event::{NodeId, Operator};
use crate::plan::query::{Operand, Query};
use crate::plan::statement::Statement;

/// Optimize a plan.
///
/// Two rewrites are applied per statement, in order:
///
/// 1. Substitution: when a conjunction query lists the operands of one
///    of its composite inputs individually, those operands are replaced
///    by the composite input itself, e.g. `AND(C, E, B, D, F)` with
///    input `AND(C, E, D, F)` becomes `AND(B, AND(C, E, D, F))`.
/// 2. Dependency resolution: every composite operand of the (possibly
///    rewritten) query must have a producer. If no statement in the plan
///    advertises it, a helper statement is minted on a fresh node that
///    computes the sub-query from its own operands.
///
/// Afterwards the statement's inputs are normalized to the rewritten
/// query's direct operands, which by construction are all either
/// primitive events or advertised composites.
pub fn optimize(statements: &[Statement]) -> Result<Vec<Statement>> {
    let mut producers: BTreeMap<String, Vec<NodeId>> = BTreeMap::new();
    let mut highest_node: u8 = 0;

    for statement in statements {
        for node in &statement.nodes {
            highest_node = highest_node.max(node.value());
        }
        producers
            .entry(statement.query.topic())
            .or_default()
            .extend(statement.nodes.iter().copied());
    }

    let mut optimized = Vec::new();
    let mut next_helper = highest_node + 1;

    for statement in statements {
        let query = substitute_composite_inputs(statement)?;

        // Mint helpers for composite operands nothing advertises yet.
        for operand in &query.operands {
            let Operand::Composite(sub) = operand else {
                continue;
            };
            if producers.contains_key(&sub.topic()) {
                continue;
            }

            let helper_node = NodeId::new(next_helper)?;
            next_helper += 1;

            let helper =
                Statement::new(vec![helper_node], sub.clone(), sub.operands.clone())?;
            producers.entry(sub.topic()).or_default().push(helper_node);
            optimized.push(helper);
        }

        let inputs = query.operands.clone();
        optimized.push(Statement::new(statement.nodes.clone(), query, inputs)?);
    }

    Ok(optimized)
}

/// Rewrite a conjunction whose composite input is spelled out operand by
/// operand, folding those operands into the composite. Order of the
/// remaining operands is preserved, with the composite appended last.
fn substitute_composite_inputs(statement: &Statement) -> Result<Query> {
    let mut query = statement.query.clone();

    if query.operator != Operator::And {
        return Ok(query);
    }

    for input in &statement.inputs {
        let Operand::Composite(sub) = input else {
            continue;
        };
        let composite = Operand::Composite(sub.clone());

        let already_present = query.contains(&composite);
        let covers_operands = sub
            .operands
            .iter()
            .all(|operand| query.operands.contains(operand));

        if !already_present && covers_operands {
            let mut rewritten: Vec<Operand> = query
                .operands
                .iter()
                .filter(|operand| !sub.operands.contains(*operand))
                .cloned()
                .collect();
            rewritten.push(composite);
            query = Query::new(query.operator, rewritten)?;
        }
    }

    Ok(query)
}
