//! Worker Node Integration Tests
//!
//! End-to-end routing over the in-memory bus: nodes subscribe to their
//! input topics, evaluate patterns and advertise composite events that
//! downstream nodes consume in turn.

use std::time::Duration;

use cascade::bus::{EventEnvelope, InMemoryHub, MessageBus};
use cascade::engine::NaiveEngine;
use cascade::node::{NodeControl, NodeHandle, WorkerNode};
use cascade::plan::{topic, NodeId, StatementParser};

const RECEIVE_TIMEOUT: Duration = Duration::from_secs(5);

fn spawn_node(
    hub: &InMemoryHub,
    id: u8,
    statements: &[&str],
) -> (NodeHandle, std::thread::JoinHandle<()>) {
    let parsed = statements
        .iter()
        .map(|text| StatementParser::new(*text).parse().unwrap())
        .collect::<Vec<_>>();

    let mut node = WorkerNode::new(
        NodeId::new(id).unwrap(),
        Box::new(hub.endpoint()),
        Box::new(NaiveEngine::new()),
    );
    node.bootstrap(parsed).unwrap();
    let handle = node.handle();

    let join = std::thread::spawn(move || {
        node.run().unwrap();
    });
    (handle, join)
}

fn expect_event(bus: &mut dyn MessageBus, destination: &str) -> String {
    let message = bus
        .poll(RECEIVE_TIMEOUT)
        .unwrap()
        .unwrap_or_else(|| panic!("no delivery on {}", destination));
    assert_eq!(message.destination, destination);
    EventEnvelope::decode_name(&message.body)
}

#[test]
fn node_advertises_a_fired_sequence() {
    let hub = InMemoryHub::new();
    let (handle, join) = spawn_node(&hub, 4, &["SELECT SEQ(J, A) FROM J, A ON {4}"]);

    let mut producer = hub.endpoint();
    let mut observer = hub.endpoint();
    observer.subscribe("/topic/SEQ(J-A)", "sub-observer").unwrap();

    producer.publish("J", "/topic/J").unwrap();
    producer.publish("A", "/topic/A").unwrap();

    let fired = expect_event(&mut observer, "/topic/SEQ(J-A)");
    assert_eq!(fired, "SEQ(J-A)");

    handle.stop();
    join.join().unwrap();
}

#[test]
fn composite_events_flow_between_nodes() {
    let hub = InMemoryHub::new();

    // Node 4 computes SEQ(J, A); node 9 consumes it alongside E.
    let (seq_handle, seq_join) = spawn_node(&hub, 4, &["SELECT SEQ(J, A) FROM J, A ON {4}"]);
    let (and_handle, and_join) =
        spawn_node(&hub, 9, &["SELECT AND(E, SEQ(J, A)) FROM E, SEQ(J, A) ON {9}"]);

    let mut producer = hub.endpoint();
    let mut observer = hub.endpoint();
    observer
        .subscribe("/topic/AND(E-SEQ(J-A))", "sub-observer")
        .unwrap();

    producer.publish("E", "/topic/E").unwrap();
    producer.publish("J", "/topic/J").unwrap();
    producer.publish("A", "/topic/A").unwrap();

    let fired = expect_event(&mut observer, "/topic/AND(E-SEQ(J-A))");
    assert_eq!(fired, "AND(E-SEQ(J-A))");

    seq_handle.stop();
    and_handle.stop();
    seq_join.join().unwrap();
    and_join.join().unwrap();
}

#[test]
fn dynamically_added_statement_is_evaluated() {
    let hub = InMemoryHub::new();
    let (handle, join) = spawn_node(&hub, 2, &["SELECT SEQ(J, A) FROM J, A ON {2}"]);

    let added = StatementParser::new("SELECT AND(C, D) FROM C, D ON {2}")
        .parse()
        .unwrap();
    assert!(handle.send(NodeControl::Add(added)));

    let mut producer = hub.endpoint();
    let mut observer = hub.endpoint();
    observer.subscribe("/topic/AND(C-D)", "sub-observer").unwrap();

    // Give the control message a couple of loop iterations to land.
    std::thread::sleep(Duration::from_millis(300));

    producer.publish("D", "/topic/D").unwrap();
    producer.publish("C", "/topic/C").unwrap();

    let fired = expect_event(&mut observer, "/topic/AND(C-D)");
    assert_eq!(fired, "AND(C-D)");

    handle.stop();
    join.join().unwrap();
}

#[test]
fn removed_statement_stops_firing() {
    let hub = InMemoryHub::new();
    let (handle, join) = spawn_node(&hub, 2, &["SELECT AND(C, D) FROM C, D ON {2}"]);

    let removed_topic = StatementParser::new("SELECT AND(C, D) FROM C, D ON {2}")
        .parse()
        .unwrap()
        .query
        .topic();
    assert!(handle.send(NodeControl::Remove(removed_topic)));
    std::thread::sleep(Duration::from_millis(300));

    let mut producer = hub.endpoint();
    let mut observer = hub.endpoint();
    observer.subscribe("/topic/AND(C-D)", "sub-observer").unwrap();

    producer.publish("C", "/topic/C").unwrap();
    producer.publish("D", "/topic/D").unwrap();

    assert_eq!(observer.poll(Duration::from_millis(500)).unwrap(), None);

    handle.stop();
    join.join().unwrap();
}

#[test]
fn subscription_and_advertisement_lists_derive_from_statements() {
    let hub = InMemoryHub::new();
    let statement =
        StatementParser::new("SELECT AND(E, SEQ(J, A)) FROM E, SEQ(J, A) ON {9}")
            .parse()
            .unwrap();

    let mut node = WorkerNode::new(
        NodeId::new(9).unwrap(),
        Box::new(hub.endpoint()),
        Box::new(NaiveEngine::new()),
    );
    node.bootstrap(vec![statement]).unwrap();

    assert_eq!(
        node.topic_subscriptions(),
        vec!["/topic/E".to_string(), "/topic/SEQ(J-A)".to_string()]
    );
    assert_eq!(
        node.topic_advertisements(),
        vec![topic::destination("AND(E-SEQ(J-A))")]
    );
}
