//! In-process message bus for tests and broker-less runs.
//!
//! A hub fans published messages out to every endpoint holding a
//! matching subscription. Endpoints created from the same hub see each
//! other's publishes, which is enough to exercise multi-node routing
//! without a broker.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::{BusError, BusMessage, MessageBus};

struct SubscriptionEntry {
    subscription_id: String,
    destination: String,
    inbox: Arc<Mutex<VecDeque<BusMessage>>>,
}

/// Shared fan-out point connecting [`InMemoryBus`] endpoints.
#[derive(Clone, Default)]
pub struct InMemoryHub {
    subscriptions: Arc<Mutex<Vec<SubscriptionEntry>>>,
}

impl InMemoryHub {
    pub fn new() -> Self {
        InMemoryHub::default()
    }

    /// Create a new endpoint connected to this hub.
    pub fn endpoint(&self) -> InMemoryBus {
        InMemoryBus {
            hub: self.clone(),
            inbox: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    fn deliver(&self, message: &BusMessage) {
        let subscriptions = self.subscriptions.lock().unwrap();
        for entry in subscriptions.iter() {
            if entry.destination == message.destination {
                entry.inbox.lock().unwrap().push_back(message.clone());
            }
        }
    }
}

/// One endpoint on an [`InMemoryHub`].
pub struct InMemoryBus {
    hub: InMemoryHub,
    inbox: Arc<Mutex<VecDeque<BusMessage>>>,
}

impl MessageBus for InMemoryBus {
    fn subscribe(&mut self, destination: &str, subscription_id: &str) -> Result<(), BusError> {
        let mut subscriptions = self.hub.subscriptions.lock().unwrap();
        subscriptions.push(SubscriptionEntry {
            subscription_id: subscription_id.to_string(),
            destination: destination.to_string(),
            inbox: Arc::clone(&self.inbox),
        });
        Ok(())
    }

    fn unsubscribe(&mut self, subscription_id: &str) -> Result<(), BusError> {
        let mut subscriptions = self.hub.subscriptions.lock().unwrap();
        subscriptions.retain(|entry| {
            !(entry.subscription_id == subscription_id
                && Arc::ptr_eq(&entry.inbox, &self.inbox))
        });
        Ok(())
    }

    fn publish(&mut self, body: &str, destination: &str) -> Result<(), BusError> {
        self.hub.deliver(&BusMessage {
            destination: destination.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }

    fn poll(&mut self, timeout: Duration) -> Result<Option<BusMessage>, BusError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(message) = self.inbox.lock().unwrap().pop_front() {
                return Ok(Some(message));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn disconnect(&mut self) -> Result<(), BusError> {
        let mut subscriptions = self.hub.subscriptions.lock().unwrap();
        subscriptions.retain(|entry| !Arc::ptr_eq(&entry.inbox, &self.inbox));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_to_matching_subscribers_only() {
        let hub = InMemoryHub::new();
        let mut producer = hub.endpoint();
        let mut listener = hub.endpoint();
        let mut bystander = hub.endpoint();

        listener.subscribe("/topic/A", "sub-1-A").unwrap();
        bystander.subscribe("/topic/B", "sub-2-B").unwrap();

        producer.publish("A", "/topic/A").unwrap();

        let delivered = listener.poll(Duration::from_millis(50)).unwrap();
        assert_eq!(
            delivered,
            Some(BusMessage { destination: "/topic/A".to_string(), body: "A".to_string() })
        );
        assert_eq!(bystander.poll(Duration::from_millis(10)).unwrap(), None);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let hub = InMemoryHub::new();
        let mut producer = hub.endpoint();
        let mut listener = hub.endpoint();

        listener.subscribe("/topic/A", "sub-1-A").unwrap();
        listener.unsubscribe("sub-1-A").unwrap();
        producer.publish("A", "/topic/A").unwrap();

        assert_eq!(listener.poll(Duration::from_millis(10)).unwrap(), None);
    }
}
