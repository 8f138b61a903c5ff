//! Message-bus boundary.
//!
//! The evaluation core only defines the data it hands to the transport:
//! destinations are the namespaced topic names derived by the plan
//! module, bodies carry the event name. Transport retry policy is the
//! implementation's concern.

pub mod memory;
pub mod mqtt;

pub use memory::{InMemoryBus, InMemoryHub};
pub use mqtt::{MqttBus, MqttBusConfig};

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A message delivered from the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub destination: String,
    pub body: String,
}

/// Wire payload of a published event: the event (topic) name plus the
/// destination it was advertised on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub name: String,
    pub origin: String,
}

impl EventEnvelope {
    pub fn new(name: impl Into<String>, origin: impl Into<String>) -> Self {
        EventEnvelope { name: name.into(), origin: origin.into() }
    }

    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.name.clone())
    }

    /// Extract the event name from a message body. Bodies that are not
    /// envelopes (e.g. bare primitive codes from an external producer)
    /// are taken verbatim.
    pub fn decode_name(body: &str) -> String {
        match serde_json::from_str::<EventEnvelope>(body) {
            Ok(envelope) => envelope.name,
            Err(_) => body.trim().to_string(),
        }
    }
}

/// Error types for bus transports.
#[derive(Debug)]
pub enum BusError {
    Connection(String),
    Subscription(String),
    Publish(String),
}

impl std::fmt::Display for BusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BusError::Connection(msg) => write!(f, "Connection error: {}", msg),
            BusError::Subscription(msg) => write!(f, "Subscription error: {}", msg),
            BusError::Publish(msg) => write!(f, "Publish error: {}", msg),
        }
    }
}

impl std::error::Error for BusError {}

/// The pub/sub primitives a worker node needs from its transport.
///
/// One connection per node; all cross-node coordination happens through
/// these five calls, never through shared memory.
pub trait MessageBus: Send {
    /// Register interest in a destination under a caller-chosen
    /// subscription id.
    fn subscribe(&mut self, destination: &str, subscription_id: &str) -> Result<(), BusError>;

    /// Drop a previously registered subscription.
    fn unsubscribe(&mut self, subscription_id: &str) -> Result<(), BusError>;

    /// Publish a body to a destination.
    fn publish(&mut self, body: &str, destination: &str) -> Result<(), BusError>;

    /// Wait up to `timeout` for the next delivery on any subscribed
    /// destination. `None` means the timeout elapsed quietly.
    fn poll(&mut self, timeout: Duration) -> Result<Option<BusMessage>, BusError>;

    /// Tear the connection down.
    fn disconnect(&mut self) -> Result<(), BusError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_round_trip() {
        let envelope = EventEnvelope::new("SEQ(J-A)", "/topic/SEQ(J-A)");
        let body = envelope.encode();
        assert_eq!(EventEnvelope::decode_name(&body), "SEQ(J-A)");
    }

    #[test]
    fn bare_body_decodes_verbatim() {
        assert_eq!(EventEnvelope::decode_name("A"), "A");
        assert_eq!(EventEnvelope::decode_name(" A \n"), "A");
    }
}
