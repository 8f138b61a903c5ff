//! Plan CLI - inspect and optimize a distributed evaluation plan.
//!
//! Usage:
//!   plan-cli                               # inspect the built-in reference plan
//!   plan-cli --plan plan.txt               # one statement per line
//!   plan-cli --plan plan.txt --optimize    # print the optimized plan
//!   plan-cli --topics                      # include subscribe/advertise lists

use clap::Parser;
use std::collections::BTreeMap;

use cascade::plan::{optimize, topic, NodeId, Statement, StatementParser};

/// The reference distributed evaluation plan.
const REFERENCE_PLAN: [&str; 6] = [
    "SELECT SEQ(A, F, C) FROM A, F, C ON {0}",
    "SELECT SEQ(J, A) FROM J, A ON {4}",
    "SELECT AND(C, E, D, F) FROM C, E, D, F ON {2, 4}",
    "SELECT AND(C, E, B, D, F) FROM B, AND(C, E, D, F) ON {0, 1, 2, 3, 4, 5}",
    "SELECT AND(E, SEQ(J, A)) FROM E, SEQ(J, A) ON {9}",
    "SELECT AND(E, SEQ(C, J, A)) FROM AND(E, SEQ(J, A)), C ON {5, 9}",
];

#[derive(Parser, Debug)]
#[command(name = "plan-cli")]
#[command(about = "Plan CLI - parse, optimize and inspect evaluation plans")]
struct Args {
    /// Plan file, one statement per line ('#' starts a comment)
    #[arg(short, long)]
    plan: Option<String>,

    /// Run the dependency optimizer before printing
    #[arg(short, long)]
    optimize: bool,

    /// Print subscribe/advertise topic lists per node
    #[arg(short, long)]
    topics: bool,
}

fn load_plan(args: &Args) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let Some(path) = &args.plan else {
        return Ok(REFERENCE_PLAN.iter().map(|s| s.to_string()).collect());
    };
    let contents = std::fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let texts = load_plan(&args)?;

    let mut statements: Vec<Statement> = Vec::new();
    for text in &texts {
        match StatementParser::new(text.as_str()).parse() {
            Ok(statement) => statements.push(statement),
            Err(err) => {
                eprintln!("Error: invalid statement '{}': {}", text, err);
                std::process::exit(1);
            }
        }
    }

    if args.optimize {
        statements = optimize(&statements)?;
        println!("Optimized plan:");
    } else {
        println!("Plan:");
    }
    for statement in &statements {
        println!("  {}", statement);
    }
    println!();

    let mut by_node: BTreeMap<NodeId, Vec<&Statement>> = BTreeMap::new();
    for statement in &statements {
        for node in &statement.nodes {
            by_node.entry(*node).or_default().push(statement);
        }
    }

    println!("Assignments:");
    for (node, assigned) in &by_node {
        println!("  node {} ({} statement{})", node, assigned.len(), plural(assigned.len()));
        for statement in assigned {
            println!("    {}", statement);
            if args.topics {
                for name in statement.input_topics() {
                    println!("      subscribe {}", topic::destination(&name));
                }
                println!("      advertise {}", topic::destination(&statement.query.topic()));
            }
        }
    }

    Ok(())
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
