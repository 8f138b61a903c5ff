//! MQTT transport for worker nodes.
//!
//! Each bus owns its own single-threaded tokio runtime and drives the
//! rumqttc event loop from the caller's thread via `block_on`. Event
//! loop errors are logged and swallowed so a broker hiccup shows up as
//! an empty poll rather than a dead node.

use std::collections::HashMap;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::runtime::Runtime;
use tracing::{debug, warn};

use super::{BusError, BusMessage, MessageBus};

/// Configuration for the MQTT bus connection.
#[derive(Debug, Clone)]
pub struct MqttBusConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive_secs: u64,
    pub channel_capacity: usize,
}

impl Default for MqttBusConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "cascade_node".to_string(),
            keep_alive_secs: 30,
            channel_capacity: 100,
        }
    }
}

/// MQTT-backed [`MessageBus`].
pub struct MqttBus {
    client: AsyncClient,
    eventloop: EventLoop,
    runtime: Runtime,
    subscriptions: HashMap<String, String>,
}

impl MqttBus {
    /// Connect to the broker described by `config`.
    pub fn connect(config: MqttBusConfig) -> Result<Self, BusError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| BusError::Connection(err.to_string()))?;

        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        let (client, eventloop) = AsyncClient::new(options, config.channel_capacity);
        debug!(host = %config.host, port = config.port, "mqtt bus connecting");

        Ok(MqttBus { client, eventloop, runtime, subscriptions: HashMap::new() })
    }
}

impl MessageBus for MqttBus {
    fn subscribe(&mut self, destination: &str, subscription_id: &str) -> Result<(), BusError> {
        self.runtime
            .block_on(self.client.subscribe(destination, QoS::AtLeastOnce))
            .map_err(|err| BusError::Subscription(err.to_string()))?;
        self.subscriptions
            .insert(subscription_id.to_string(), destination.to_string());
        debug!(destination, subscription_id, "subscribed");
        Ok(())
    }

    fn unsubscribe(&mut self, subscription_id: &str) -> Result<(), BusError> {
        let destination = self
            .subscriptions
            .remove(subscription_id)
            .ok_or_else(|| BusError::Subscription(format!("unknown id: {}", subscription_id)))?;
        self.runtime
            .block_on(self.client.unsubscribe(&destination))
            .map_err(|err| BusError::Subscription(err.to_string()))?;
        Ok(())
    }

    fn publish(&mut self, body: &str, destination: &str) -> Result<(), BusError> {
        self.runtime
            .block_on(self.client.publish(destination, QoS::AtLeastOnce, false, body))
            .map_err(|err| BusError::Publish(err.to_string()))
    }

    fn poll(&mut self, timeout: Duration) -> Result<Option<BusMessage>, BusError> {
        let polled = self
            .runtime
            .block_on(tokio::time::timeout(timeout, self.eventloop.poll()));

        match polled {
            Ok(Ok(Event::Incoming(Packet::Publish(publish)))) => {
                let body = String::from_utf8_lossy(&publish.payload).to_string();
                Ok(Some(BusMessage { destination: publish.topic.clone(), body }))
            }
            Ok(Ok(_)) => Ok(None),
            Ok(Err(err)) => {
                // Reconnection is rumqttc's job; report an empty poll.
                warn!(error = %err, "mqtt event loop error");
                Ok(None)
            }
            Err(_elapsed) => Ok(None),
        }
    }

    fn disconnect(&mut self) -> Result<(), BusError> {
        self.runtime
            .block_on(self.client.disconnect())
            .map_err(|err| BusError::Connection(err.to_string()))
    }
}
