//! The worker node loop.
//!
//! A node owns one bus connection, one embedded engine and the list of
//! statements it evaluates. Each loop iteration polls the control
//! channel with a bounded timeout, processes at most one control
//! message, then drains bus deliveries into the engine and publishes
//! whatever fired. Cancellation flips the running flag; the in-flight
//! iteration completes first.

use std::collections::BTreeSet;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::bus::{BusError, EventEnvelope, MessageBus};
use crate::engine::{CepEngine, EngineError};
use crate::plan::{topic, NodeId, Statement};

/// Bounded wait on the control channel per loop iteration. Node
/// responsiveness is bounded by this regardless of statement count.
pub const CONTROL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Bounded wait for one bus delivery.
const BUS_POLL_TIMEOUT: Duration = Duration::from_millis(20);

/// Upper bound on deliveries drained per iteration, so a flooded topic
/// cannot starve the control channel.
const MAX_DELIVERIES_PER_ITERATION: usize = 64;

/// Control messages accepted by a running node.
#[derive(Debug, Clone)]
pub enum NodeControl {
    Start,
    Stop,
    /// Install an additional statement. Failure to install is logged
    /// and skipped; the node keeps running.
    Add(Statement),
    /// Remove the statement whose query topic matches.
    Remove(String),
}

/// Error types for the node runtime.
#[derive(Debug)]
pub enum NodeError {
    Bus(BusError),
    Engine(EngineError),
}

impl std::fmt::Display for NodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeError::Bus(err) => write!(f, "Bus error: {}", err),
            NodeError::Engine(err) => write!(f, "Engine error: {}", err),
        }
    }
}

impl std::error::Error for NodeError {}

impl From<BusError> for NodeError {
    fn from(err: BusError) -> Self {
        NodeError::Bus(err)
    }
}

impl From<EngineError> for NodeError {
    fn from(err: EngineError) -> Self {
        NodeError::Engine(err)
    }
}

/// Cloneable handle for sending control messages to a node from another
/// thread.
#[derive(Clone)]
pub struct NodeHandle {
    sender: Sender<NodeControl>,
}

impl NodeHandle {
    /// Send a control message. Returns false when the node is gone.
    pub fn send(&self, message: NodeControl) -> bool {
        self.sender.send(message).is_ok()
    }

    pub fn stop(&self) -> bool {
        self.send(NodeControl::Stop)
    }
}

/// A logical worker unit evaluating statements over the bus.
pub struct WorkerNode {
    id: NodeId,
    bus: Box<dyn MessageBus>,
    engine: Box<dyn CepEngine>,
    statements: Vec<Statement>,
    control: Receiver<NodeControl>,
    control_sender: Sender<NodeControl>,
    running: bool,
}

impl WorkerNode {
    /// Build a node. The control channel is constructed fresh per
    /// instance; nodes never share channels.
    pub fn new(id: NodeId, bus: Box<dyn MessageBus>, engine: Box<dyn CepEngine>) -> Self {
        let (control_sender, control) = mpsc::channel();
        WorkerNode {
            id,
            bus,
            engine,
            statements: Vec::new(),
            control,
            control_sender,
            running: false,
        }
    }

    /// A handle for controlling this node from another thread.
    pub fn handle(&self) -> NodeHandle {
        NodeHandle { sender: self.control_sender.clone() }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Bus destinations this node subscribes to: the inputs of every
    /// statement, deduplicated.
    pub fn topic_subscriptions(&self) -> Vec<String> {
        let destinations: BTreeSet<String> = self
            .statements
            .iter()
            .flat_map(|statement| statement.input_topics())
            .map(|name| topic::destination(&name))
            .collect();
        destinations.into_iter().collect()
    }

    /// Bus destinations this node advertises: one per statement's query.
    pub fn topic_advertisements(&self) -> Vec<String> {
        self.statements
            .iter()
            .map(|statement| topic::destination(&statement.query.topic()))
            .collect()
    }

    fn subscription_id(&self, destination: &str) -> String {
        format!("sub-{}-{}", self.id, destination)
    }

    /// Install the node's initial statements, deploy the engine and
    /// subscribe to every input topic. A failure here is fatal: the
    /// node cannot start without a valid plan.
    pub fn bootstrap(&mut self, statements: Vec<Statement>) -> Result<(), NodeError> {
        self.statements = statements;
        self.engine.deploy(&self.statements)?;
        for destination in self.topic_subscriptions() {
            let id = self.subscription_id(&destination);
            self.bus.subscribe(&destination, &id)?;
        }
        info!(
            node = %self.id,
            statements = self.statements.len(),
            subscriptions = self.topic_subscriptions().len(),
            "node bootstrapped"
        );
        Ok(())
    }

    /// Run until stopped, then unsubscribe and disconnect.
    pub fn run(&mut self) -> Result<(), NodeError> {
        self.running = true;
        info!(node = %self.id, "node running");

        while self.running {
            self.step()?;
        }

        for destination in self.topic_subscriptions() {
            let id = self.subscription_id(&destination);
            if let Err(err) = self.bus.unsubscribe(&id) {
                warn!(node = %self.id, error = %err, "unsubscribe failed during shutdown");
            }
        }
        self.engine.shutdown();
        self.bus.disconnect()?;
        info!(node = %self.id, "node stopped");
        Ok(())
    }

    /// One loop iteration: at most one control message, then a bounded
    /// drain of bus deliveries, then publication of fired patterns.
    fn step(&mut self) -> Result<(), NodeError> {
        match self.control.recv_timeout(CONTROL_POLL_INTERVAL) {
            Ok(message) => self.apply_control(message)?,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                // Every handle dropped; nothing can stop us later.
                self.running = false;
                return Ok(());
            }
        }

        if !self.running {
            return Ok(());
        }

        for _ in 0..MAX_DELIVERIES_PER_ITERATION {
            match self.bus.poll(BUS_POLL_TIMEOUT)? {
                Some(message) => {
                    let name = EventEnvelope::decode_name(&message.body);
                    debug!(node = %self.id, event = %name, "event received");
                    self.engine.send_event(&name);
                }
                None => break,
            }
        }

        for output in self.engine.drain_outputs() {
            let destination = topic::destination(&output);
            let body = EventEnvelope::new(output.clone(), destination.clone()).encode();
            self.bus.publish(&body, &destination)?;
            debug!(node = %self.id, topic = %output, "composite event published");
        }

        Ok(())
    }

    fn apply_control(&mut self, message: NodeControl) -> Result<(), NodeError> {
        match message {
            NodeControl::Start => {
                self.running = true;
            }
            NodeControl::Stop => {
                info!(node = %self.id, "stop requested");
                self.running = false;
            }
            NodeControl::Add(statement) => {
                // Recoverable: a bad dynamic statement is skipped.
                if let Err(err) = self.install(statement) {
                    warn!(node = %self.id, error = %err, "skipping statement");
                }
            }
            NodeControl::Remove(query_topic) => {
                self.remove(&query_topic)?;
            }
        }
        Ok(())
    }

    fn install(&mut self, statement: Statement) -> Result<(), NodeError> {
        let existing = self.topic_subscriptions();
        self.statements.push(statement);
        self.engine.deploy(&self.statements)?;

        for destination in self.topic_subscriptions() {
            if !existing.contains(&destination) {
                let id = self.subscription_id(&destination);
                self.bus.subscribe(&destination, &id)?;
            }
        }
        Ok(())
    }

    fn remove(&mut self, query_topic: &str) -> Result<(), NodeError> {
        let before = self.topic_subscriptions();
        self.statements
            .retain(|statement| statement.query.topic() != query_topic);
        self.engine.deploy(&self.statements)?;

        let after = self.topic_subscriptions();
        for destination in before {
            if !after.contains(&destination) {
                let id = self.subscription_id(&destination);
                self.bus.unsubscribe(&id)?;
            }
        }
        Ok(())
    }
}
