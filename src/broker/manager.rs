//! Broker - central coordination for module messaging
//!
//! The broker owns a single message log. Every attached module gets a
//! [`BrokerHandle`] to publish with and a [`Subscription`] the host drains to
//! deliver messages. Messages fan out to every attached module except the one
//! that published them.

use crate::broker::error::{BrokerError, BrokerResult};
use crate::broker::handle::BrokerHandle;
use crate::broker::internal::{LogStats, MessageLog};
use crate::broker::subscription::Subscription;
use crate::core::sync::{handle_rwlock_read, handle_rwlock_write};
use crate::message::Message;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Default number of messages the broker retains before refusing publishes
pub const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Debug)]
struct Attachment {
    module_name: String,
    attached: Arc<AtomicBool>,
}

/// In-process message broker
///
/// # Thread Safety
///
/// The broker is shared as `Arc<Broker>`; handles and subscriptions keep a
/// `Weak` back-reference so a dropped broker turns their calls into
/// [`BrokerError::BrokerGone`] instead of keeping it alive.
///
/// # Example
///
/// ```rust
/// use modgate::broker::Broker;
/// use modgate::message::Message;
///
/// let broker = Broker::create(100);
/// let (_sender, _) = broker.attach("sender").unwrap();
/// let (_, inbox) = broker.attach("receiver").unwrap();
///
/// broker.publisher("host").publish(Message::new("ping")).unwrap();
/// let received = inbox.read().unwrap().unwrap();
/// assert_eq!(received.content_str(), Some("ping"));
/// ```
#[derive(Debug)]
pub struct Broker {
    next_subscriber_id: AtomicU64,
    log: Arc<MessageLog>,
    attachments: RwLock<HashMap<u64, Attachment>>,
}

fn poisoned(message: String) -> BrokerError {
    BrokerError::OperationFailed { message }
}

impl Broker {
    pub fn new(capacity: usize) -> Self {
        Self {
            next_subscriber_id: AtomicU64::new(1),
            log: Arc::new(MessageLog::new(capacity)),
            attachments: RwLock::new(HashMap::new()),
        }
    }

    pub fn create(capacity: usize) -> Arc<Self> {
        let broker = Arc::new(Self::new(capacity));
        log::debug!("Broker created with capacity {}", capacity);
        broker
    }

    pub fn capacity(&self) -> usize {
        self.log.capacity()
    }

    /// Attach a module: returns its publishing handle and its delivery subscription
    pub fn attach(self: &Arc<Self>, module_name: &str) -> BrokerResult<(BrokerHandle, Subscription)> {
        let subscriber_id = self.next_subscriber_id.fetch_add(1, Ordering::SeqCst);
        let attached = Arc::new(AtomicBool::new(true));

        self.log.register_subscriber(subscriber_id)?;
        handle_rwlock_write(self.attachments.write(), poisoned)?.insert(
            subscriber_id,
            Attachment {
                module_name: module_name.to_string(),
                attached: Arc::clone(&attached),
            },
        );

        log::debug!(
            "Broker: attached module '{}' as subscriber {}",
            module_name,
            subscriber_id
        );

        let handle = BrokerHandle::new(
            module_name.to_string(),
            Some(subscriber_id),
            Arc::downgrade(self),
            Arc::clone(&attached),
        );
        let subscription = Subscription::new(
            subscriber_id,
            module_name.to_string(),
            Arc::downgrade(self),
            Arc::clone(&self.log),
            attached,
        );
        Ok((handle, subscription))
    }

    /// Handle for a publisher that is not an attached module (the host, a test)
    pub fn publisher(self: &Arc<Self>, name: &str) -> BrokerHandle {
        BrokerHandle::new(
            name.to_string(),
            None,
            Arc::downgrade(self),
            Arc::new(AtomicBool::new(true)),
        )
    }

    /// Detach a subscriber: its handle stops publishing and its subscription drains to `None`
    ///
    /// Returns false if the subscriber was already detached.
    pub fn detach(&self, subscriber_id: u64) -> BrokerResult<bool> {
        let attachment =
            handle_rwlock_write(self.attachments.write(), poisoned)?.remove(&subscriber_id);
        let Some(attachment) = attachment else {
            return Ok(false);
        };

        attachment.attached.store(false, Ordering::Release);
        self.log.unregister_subscriber(subscriber_id)?;
        // Wake the delivery loop so it notices the detach
        self.log.notify().notify_waiters();
        log::debug!(
            "Broker: detached module '{}' (subscriber {})",
            attachment.module_name,
            subscriber_id
        );
        Ok(true)
    }

    pub(crate) fn publish_from(&self, source: Option<u64>, message: Message) -> BrokerResult<u64> {
        self.log.publish(source, message)
    }

    pub fn is_attached(&self, subscriber_id: u64) -> bool {
        self.attachments
            .read()
            .map(|attachments| attachments.contains_key(&subscriber_id))
            .unwrap_or(false)
    }

    /// Names of attached modules, sorted
    pub fn attached_modules(&self) -> BrokerResult<Vec<String>> {
        let mut names: Vec<String> = handle_rwlock_read(self.attachments.read(), poisoned)?
            .values()
            .map(|a| a.module_name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn message_count(&self) -> BrokerResult<usize> {
        self.log.len()
    }

    pub fn lag(&self, subscriber_id: u64) -> BrokerResult<u64> {
        self.log.lag(subscriber_id)
    }

    pub fn collect_garbage(&self) -> BrokerResult<usize> {
        self.log.collect_garbage()
    }

    pub fn stats(&self) -> BrokerResult<LogStats> {
        self.log.stats()
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
