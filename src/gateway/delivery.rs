//! Delivery workers
//!
//! One async task per module instance drains its broker subscription and
//! hands each message to the instance's Receive on the blocking pool. The
//! task awaits each Receive before reading the next message, so a single
//! instance never sees two messages at once while different instances run in
//! parallel. The task ends when the module is detached from the broker.

use crate::broker::Subscription;
use crate::gateway::error::GatewayError;
use crate::gateway::instance::ModuleInstance;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Spawn the delivery task; it resolves to the number of messages delivered
pub fn spawn_delivery(
    instance: Arc<ModuleInstance>,
    subscription: Subscription,
) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut delivered = 0u64;
        loop {
            let message = match subscription.recv().await {
                Ok(Some(message)) => message,
                Ok(None) => break,
                Err(e) => {
                    log::error!(
                        "Delivery to module '{}' stopped: {}",
                        instance.name(),
                        e
                    );
                    break;
                }
            };

            let target = Arc::clone(&instance);
            match tokio::task::spawn_blocking(move || target.receive(&message)).await {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(GatewayError::Lifecycle(e))) => {
                    log::debug!("Delivery to module '{}' ended: {}", instance.name(), e);
                    break;
                }
                Ok(Err(e)) => {
                    log::warn!("Delivery to module '{}' failed: {}", instance.name(), e);
                }
                Err(e) => {
                    log::error!(
                        "Receive worker for module '{}' failed: {}",
                        instance.name(),
                        e
                    );
                }
            }
        }
        log::trace!(
            "Delivery task for module '{}' finished after {} messages",
            instance.name(),
            delivered
        );
        delivered
    })
}
