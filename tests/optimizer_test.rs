//! Plan Optimizer Integration Tests
//!
//! The optimizer is a pure transformation over a whole plan: composite
//! inputs get folded into conjunction queries, unproduced sub-queries
//! get helper statements on fresh nodes, and inputs are normalized to
//! the rewritten query's direct operands.

use cascade::plan::{optimize, Statement, StatementParser};

const PLAN: [&str; 6] = [
    "SELECT SEQ(A, F, C) FROM A, F, C ON {0}",
    "SELECT SEQ(J, A) FROM J, A ON {4}",
    "SELECT AND(C, E, D, F) FROM C, E, D, F ON {2, 4}",
    "SELECT AND(C, E, B, D, F) FROM B, AND(C, E, D, F) ON {0, 1, 2, 3, 4, 5}",
    "SELECT AND(E, SEQ(J, A)) FROM E, SEQ(J, A) ON {9}",
    "SELECT AND(E, SEQ(C, J, A)) FROM AND(E, SEQ(J, A)), C ON {5, 9}",
];

const OPTIMIZED_PLAN: [&str; 7] = [
    "SELECT SEQ(A, F, C) FROM A, F, C ON {0}",
    "SELECT SEQ(J, A) FROM J, A ON {4}",
    "SELECT AND(C, E, D, F) FROM C, E, D, F ON {2, 4}",
    "SELECT AND(B, AND(C, E, D, F)) FROM B, AND(C, E, D, F) ON {0, 1, 2, 3, 4, 5}",
    "SELECT AND(E, SEQ(J, A)) FROM E, SEQ(J, A) ON {9}",
    "SELECT AND(E, SEQ(C, J, A)) FROM E, SEQ(C, J, A) ON {5, 9}",
    // Helper node computing the sub-query nothing advertised.
    "SELECT SEQ(C, J, A) FROM C, J, A ON {10}",
];

fn parse_plan(texts: &[&str]) -> Vec<Statement> {
    texts
        .iter()
        .map(|text| StatementParser::new(*text).parse().unwrap())
        .collect()
}

#[test]
fn optimizes_the_reference_plan() {
    let optimized = optimize(&parse_plan(&PLAN)).unwrap();

    let mut rendered: Vec<String> = optimized.iter().map(|s| s.to_string()).collect();
    rendered.sort();

    let mut expected: Vec<String> = OPTIMIZED_PLAN.iter().map(|s| s.to_string()).collect();
    expected.sort();

    assert_eq!(rendered, expected);
}

#[test]
fn optimizer_does_not_mutate_its_input() {
    let statements = parse_plan(&PLAN);
    let before: Vec<String> = statements.iter().map(|s| s.to_string()).collect();

    let _ = optimize(&statements).unwrap();

    let after: Vec<String> = statements.iter().map(|s| s.to_string()).collect();
    assert_eq!(before, after);
}

#[test]
fn already_optimal_plan_is_unchanged() {
    let statements = parse_plan(&[
        "SELECT SEQ(J, A) FROM J, A ON {4}",
        "SELECT AND(C, E, D, F) FROM C, E, D, F ON {2, 4}",
    ]);
    let optimized = optimize(&statements).unwrap();
    let rendered: Vec<String> = optimized.iter().map(|s| s.to_string()).collect();
    assert_eq!(
        rendered,
        vec![
            "SELECT SEQ(J, A) FROM J, A ON {4}".to_string(),
            "SELECT AND(C, E, D, F) FROM C, E, D, F ON {2, 4}".to_string(),
        ]
    );
}

#[test]
fn helper_nodes_are_minted_above_the_highest_assigned_node() {
    // A single statement whose composite operand nothing produces.
    let statements = parse_plan(&["SELECT AND(E, SEQ(J, A)) FROM E, J, A ON {3}"]);
    let optimized = optimize(&statements).unwrap();

    let rendered: Vec<String> = optimized.iter().map(|s| s.to_string()).collect();
    assert_eq!(
        rendered,
        vec![
            "SELECT SEQ(J, A) FROM J, A ON {4}".to_string(),
            "SELECT AND(E, SEQ(J, A)) FROM E, SEQ(J, A) ON {3}".to_string(),
        ]
    );
}

#[test]
fn resolves_against_an_existing_producer_without_helpers() {
    let statements = parse_plan(&[
        "SELECT SEQ(J, A) FROM J, A ON {4}",
        "SELECT AND(E, SEQ(J, A)) FROM E, J, A ON {9}",
    ]);
    let optimized = optimize(&statements).unwrap();
    assert_eq!(optimized.len(), 2);
    assert_eq!(
        optimized[1].to_string(),
        "SELECT AND(E, SEQ(J, A)) FROM E, SEQ(J, A) ON {9}"
    );
}
