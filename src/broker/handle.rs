//! Broker handle lent to modules
//!
//! A module receives a `&BrokerHandle` in Create and may clone it to keep
//! publishing for the rest of its life. The handle is cheap to clone and safe
//! to use from whatever thread Receive happens to run on.

use crate::broker::error::{BrokerError, BrokerResult};
use crate::broker::manager::Broker;
use crate::message::Message;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Publishing capability for one module
///
/// Valid between the module's Create and Destroy. Once the host detaches the
/// module, [`publish`](Self::publish) fails with [`BrokerError::Detached`].
#[derive(Clone)]
pub struct BrokerHandle {
    module_name: Arc<str>,
    subscriber_id: Option<u64>,
    broker: Weak<Broker>,
    attached: Arc<AtomicBool>,
}

impl BrokerHandle {
    pub(crate) fn new(
        module_name: String,
        subscriber_id: Option<u64>,
        broker: Weak<Broker>,
        attached: Arc<AtomicBool>,
    ) -> Self {
        Self {
            module_name: module_name.into(),
            subscriber_id,
            broker,
            attached,
        }
    }

    /// Name the module was attached under
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire) && self.broker.strong_count() > 0
    }

    /// Publish a message to every other attached module; returns its sequence number
    pub fn publish(&self, message: Message) -> BrokerResult<u64> {
        if !self.attached.load(Ordering::Acquire) {
            return Err(BrokerError::Detached {
                module_name: self.module_name.to_string(),
            });
        }
        let broker = self.broker.upgrade().ok_or(BrokerError::BrokerGone)?;
        broker.publish_from(self.subscriber_id, message)
    }
}

impl fmt::Debug for BrokerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerHandle")
            .field("module_name", &self.module_name)
            .field("attached", &self.is_attached())
            .finish()
    }
}
