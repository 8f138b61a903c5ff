//! Cascade - worker-node daemon for distributed CEP evaluation.
//!
//! Each process is one node of the evaluation plan: it parses the
//! statements assigned to it, subscribes to their input topics on the
//! bus, evaluates patterns and publishes composite events back out.
//!
//! Configuration comes from flags, falling back to the environment
//! (`BUS_HOST`, `BUS_PORT`, `NODE_ID`, `STATEMENTS`, `STARTUP_DELAY_MS`).

use clap::Parser;

use cascade::bus::{InMemoryHub, MessageBus, MqttBus, MqttBusConfig};
use cascade::config::{split_statements, NodeConfig};
use cascade::engine::NaiveEngine;
use cascade::node::{NodeControl, WorkerNode};
use cascade::plan::{NodeId, Statement, StatementParser};

#[derive(Parser, Debug)]
#[command(name = "cascade")]
#[command(about = "Cascade - evaluate CEP statements on one worker node")]
struct Args {
    /// Bus broker host
    #[arg(long)]
    bus_host: Option<String>,

    /// Bus broker port
    #[arg(long)]
    bus_port: Option<u16>,

    /// Node identifier within the evaluation plan
    #[arg(short, long)]
    node_id: Option<u8>,

    /// Statements assigned to this node, joined with '|'
    #[arg(short, long)]
    statements: Option<String>,

    /// Broker type: mqtt or none
    #[arg(short, long, default_value = "mqtt")]
    broker: String,

    /// Delay before connecting, in milliseconds
    #[arg(long)]
    startup_delay_ms: Option<u64>,
}

fn merge_config(args: &Args) -> NodeConfig {
    let mut config = NodeConfig::from_env();
    if let Some(host) = &args.bus_host {
        config.bus_host = host.clone();
    }
    if let Some(port) = args.bus_port {
        config.bus_port = port;
    }
    if let Some(node_id) = args.node_id {
        config.node_id = node_id;
    }
    if let Some(joined) = &args.statements {
        config.statements = split_statements(joined);
    }
    if let Some(delay) = args.startup_delay_ms {
        config.startup_delay_ms = delay;
    }
    config
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = merge_config(&args);

    println!("Cascade worker node");
    println!("  Node id:    {}", config.node_id);
    println!("  Broker:     {} ({}:{})", args.broker, config.bus_host, config.bus_port);
    println!("  Statements: {}", config.statements.len());
    println!();

    // A parse failure at bootstrap is fatal: the node cannot start
    // without a valid plan.
    let mut statements: Vec<Statement> = Vec::new();
    for text in &config.statements {
        match StatementParser::new(text.as_str()).parse() {
            Ok(statement) => {
                println!("  {}", statement);
                statements.push(statement);
            }
            Err(err) => {
                eprintln!("Error: invalid statement '{}': {}", text, err);
                std::process::exit(1);
            }
        }
    }

    if statements.is_empty() {
        eprintln!("Error: no statements assigned; set STATEMENTS or pass --statements");
        std::process::exit(1);
    }

    if config.startup_delay_ms > 0 {
        println!("Waiting {} ms for the broker...", config.startup_delay_ms);
        std::thread::sleep(std::time::Duration::from_millis(config.startup_delay_ms));
    }

    let bus: Box<dyn MessageBus> = match args.broker.to_lowercase().as_str() {
        "mqtt" => Box::new(MqttBus::connect(MqttBusConfig {
            host: config.bus_host.clone(),
            port: config.bus_port,
            client_id: format!("cascade_node_{}", config.node_id),
            ..Default::default()
        })?),
        "none" => Box::new(InMemoryHub::new().endpoint()),
        other => {
            eprintln!("Error: Unknown broker type: {}", other);
            eprintln!("Valid options: mqtt, none");
            std::process::exit(1);
        }
    };

    let node_id = NodeId::new(config.node_id)?;
    let mut node = WorkerNode::new(node_id, bus, Box::new(NaiveEngine::new()));
    node.bootstrap(statements)?;

    println!("Subscriptions:");
    for destination in node.topic_subscriptions() {
        println!("  {}", destination);
    }
    println!("Advertisements:");
    for destination in node.topic_advertisements() {
        println!("  {}", destination);
    }
    println!();

    let handle = node.handle();
    ctrlc::set_handler(move || {
        println!("\nReceived Ctrl+C, stopping...");
        handle.send(NodeControl::Stop);
    })?;

    node.run()?;
    println!("Node {} stopped.", node_id);
    Ok(())
}
