//! Gateway lifecycle events
//!
//! Broadcast to any number of observers. Events are informational; a lagging
//! or absent observer never blocks the gateway.

use std::time::SystemTime;
use tokio::sync::broadcast;

/// Capacity of the event channel; slower observers see `Lagged`
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEventType {
    ModuleCreated,
    CreateFailed,
    NegotiationFailed,
    ModuleStarted,
    ModuleDestroyed,
}

#[derive(Debug, Clone)]
pub struct GatewayEvent {
    pub event_type: GatewayEventType,
    pub timestamp: SystemTime,
    /// Instance name from the configuration
    pub instance: String,
    pub message: Option<String>,
}

impl GatewayEvent {
    pub fn new(event_type: GatewayEventType, instance: impl Into<String>) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            instance: instance.into(),
            message: None,
        }
    }

    pub fn with_message(
        event_type: GatewayEventType,
        instance: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(event_type, instance)
        }
    }
}

/// Sending side of the event channel
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<GatewayEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: GatewayEvent) {
        log::trace!("Gateway event: {:?} '{}'", event.event_type, event.instance);
        // No receivers is fine
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
