//! Delivery subscription for one attached module
//!
//! The host owns the subscription and drains it to call the module's Receive.
//! Dropping the subscription detaches the module from the broker.

use crate::broker::error::{BrokerError, BrokerResult};
use crate::broker::internal::MessageLog;
use crate::broker::manager::Broker;
use crate::message::Message;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

pub struct Subscription {
    subscriber_id: u64,
    module_name: String,
    broker: Weak<Broker>,
    log: Arc<MessageLog>,
    attached: Arc<AtomicBool>,
}

impl Subscription {
    pub(crate) fn new(
        subscriber_id: u64,
        module_name: String,
        broker: Weak<Broker>,
        log: Arc<MessageLog>,
        attached: Arc<AtomicBool>,
    ) -> Self {
        Self {
            subscriber_id,
            module_name,
            broker,
            log,
            attached,
        }
    }

    pub fn subscriber_id(&self) -> u64 {
        self.subscriber_id
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    /// Next pending message, or `None` if nothing is waiting
    pub fn read(&self) -> BrokerResult<Option<Message>> {
        if !self.is_attached() {
            return Err(BrokerError::Detached {
                module_name: self.module_name.clone(),
            });
        }
        self.read_pending()
    }

    // Detach clears the flag before unregistering, so a missing subscriber
    // with the flag cleared is a detach race rather than a broker fault
    fn read_pending(&self) -> BrokerResult<Option<Message>> {
        match self.log.read_next(self.subscriber_id) {
            Err(BrokerError::SubscriberNotFound { .. }) if !self.is_attached() => {
                Err(BrokerError::Detached {
                    module_name: self.module_name.clone(),
                })
            }
            other => other,
        }
    }

    /// Up to `batch_size` pending messages
    pub fn read_batch(&self, batch_size: usize) -> BrokerResult<Vec<Message>> {
        let mut batch = Vec::with_capacity(batch_size);
        for _ in 0..batch_size {
            match self.read()? {
                Some(message) => batch.push(message),
                None => break,
            }
        }
        Ok(batch)
    }

    /// Wait for the next message; `None` once the module has been detached
    pub async fn recv(&self) -> BrokerResult<Option<Message>> {
        loop {
            let notified = self.log.notify().notified();
            tokio::pin!(notified);
            // Register interest before checking so a publish in between is not missed
            notified.as_mut().enable();

            if !self.is_attached() {
                return Ok(None);
            }
            match self.read_pending() {
                Ok(Some(message)) => return Ok(Some(message)),
                Ok(None) => {}
                Err(BrokerError::Detached { .. }) => return Ok(None),
                Err(e) => return Err(e),
            }

            notified.await;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(broker) = self.broker.upgrade() {
            let _ = broker.detach(self.subscriber_id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("subscriber_id", &self.subscriber_id)
            .field("module_name", &self.module_name)
            .field("attached", &self.is_attached())
            .finish()
    }
}
