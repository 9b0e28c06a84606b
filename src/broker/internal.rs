//! Sequence-ordered message log shared by all subscribers
//!
//! - Sequence numbers are assigned under the same lock that appends the entry,
//!   so readers never observe a gap that is filled later
//! - Each subscriber keeps its own read position
//! - A subscriber never reads back messages it published itself
//! - Entries read by every subscriber are garbage collected

use crate::broker::error::{BrokerError, BrokerResult};
use crate::core::sync::{handle_rwlock_read, handle_rwlock_write};
use crate::message::Message;
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use tokio::sync::Notify;

#[derive(Debug, Clone)]
struct LogEntry {
    sequence: u64,
    /// Subscriber id of the publishing module, `None` for host publishers
    source: Option<u64>,
    message: Message,
}

#[derive(Debug)]
struct LogBuffer {
    next_sequence: u64,
    entries: VecDeque<LogEntry>,
}

#[derive(Debug, Clone)]
struct SubscriberPosition {
    next_sequence: u64,
}

/// Statistics snapshot of the message log
#[derive(Debug, Clone, PartialEq)]
pub struct LogStats {
    /// Messages currently retained
    pub total_messages: usize,
    /// Payload and property bytes currently retained
    pub total_bytes: usize,
    /// Registered subscribers
    pub subscribers: usize,
    /// Sequence the next published message will receive
    pub head_sequence: u64,
}

#[derive(Debug)]
pub struct MessageLog {
    buffer: RwLock<LogBuffer>,
    positions: RwLock<HashMap<u64, SubscriberPosition>>,
    capacity: usize,
    notify: Notify,
}

fn poisoned(message: String) -> BrokerError {
    BrokerError::OperationFailed { message }
}

impl MessageLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: RwLock::new(LogBuffer {
                next_sequence: 1,
                entries: VecDeque::new(),
            }),
            positions: RwLock::new(HashMap::new()),
            capacity,
            notify: Notify::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> BrokerResult<usize> {
        Ok(handle_rwlock_read(self.buffer.read(), poisoned)?.entries.len())
    }

    pub fn head_sequence(&self) -> BrokerResult<u64> {
        Ok(handle_rwlock_read(self.buffer.read(), poisoned)?.next_sequence)
    }

    pub(crate) fn notify(&self) -> &Notify {
        &self.notify
    }

    /// Register a subscriber at the current head; it sees only later messages
    pub fn register_subscriber(&self, subscriber_id: u64) -> BrokerResult<()> {
        let head = self.head_sequence()?;
        handle_rwlock_write(self.positions.write(), poisoned)?.insert(
            subscriber_id,
            SubscriberPosition {
                next_sequence: head,
            },
        );
        Ok(())
    }

    /// Returns true if the subscriber was registered
    pub fn unregister_subscriber(&self, subscriber_id: u64) -> BrokerResult<bool> {
        let removed = handle_rwlock_write(self.positions.write(), poisoned)?
            .remove(&subscriber_id)
            .is_some();
        Ok(removed)
    }

    /// Append a message and wake every waiting subscriber
    pub fn publish(&self, source: Option<u64>, message: Message) -> BrokerResult<u64> {
        if self.len()? >= self.capacity {
            self.collect_garbage()?;
        }

        let sequence = {
            let mut buffer = handle_rwlock_write(self.buffer.write(), poisoned)?;
            if buffer.entries.len() >= self.capacity {
                return Err(BrokerError::BrokerFull {
                    capacity: self.capacity,
                });
            }
            let sequence = buffer.next_sequence;
            buffer.next_sequence += 1;
            buffer.entries.push_back(LogEntry {
                sequence,
                source,
                message,
            });
            sequence
        };

        self.notify.notify_waiters();
        Ok(sequence)
    }

    /// Next message for `subscriber_id`, skipping its own publications
    pub fn read_next(&self, subscriber_id: u64) -> BrokerResult<Option<Message>> {
        let position = handle_rwlock_read(self.positions.read(), poisoned)?
            .get(&subscriber_id)
            .map(|p| p.next_sequence)
            .ok_or(BrokerError::SubscriberNotFound { subscriber_id })?;

        let (found, head) = {
            let buffer = handle_rwlock_read(self.buffer.read(), poisoned)?;
            let found = buffer
                .entries
                .iter()
                .find(|entry| entry.sequence >= position && entry.source != Some(subscriber_id))
                .cloned();
            (found, buffer.next_sequence)
        };

        // Without a match every retained entry up to head is either read or our own
        let next_sequence = found.as_ref().map_or(head, |entry| entry.sequence + 1);
        if let Some(pos) =
            handle_rwlock_write(self.positions.write(), poisoned)?.get_mut(&subscriber_id)
        {
            pos.next_sequence = pos.next_sequence.max(next_sequence);
        }

        Ok(found.map(|entry| entry.message))
    }

    /// Messages published after the subscriber's position (including its own)
    pub fn lag(&self, subscriber_id: u64) -> BrokerResult<u64> {
        let head = self.head_sequence()?;
        let position = handle_rwlock_read(self.positions.read(), poisoned)?
            .get(&subscriber_id)
            .map(|p| p.next_sequence)
            .ok_or(BrokerError::SubscriberNotFound { subscriber_id })?;
        Ok(head.saturating_sub(position))
    }

    /// Drop entries every subscriber has moved past; returns the count removed
    ///
    /// With no subscribers nothing can ever read the retained entries, so all
    /// of them are dropped.
    pub fn collect_garbage(&self) -> BrokerResult<usize> {
        let min_position = handle_rwlock_read(self.positions.read(), poisoned)?
            .values()
            .map(|p| p.next_sequence)
            .min();

        let mut buffer = handle_rwlock_write(self.buffer.write(), poisoned)?;
        let keep_from = min_position.unwrap_or(buffer.next_sequence);
        let before = buffer.entries.len();
        buffer.entries.retain(|entry| entry.sequence >= keep_from);
        Ok(before - buffer.entries.len())
    }

    pub fn stats(&self) -> BrokerResult<LogStats> {
        let subscribers = handle_rwlock_read(self.positions.read(), poisoned)?.len();
        let buffer = handle_rwlock_read(self.buffer.read(), poisoned)?;
        Ok(LogStats {
            total_messages: buffer.entries.len(),
            total_bytes: buffer
                .entries
                .iter()
                .map(|entry| entry.message.size_bytes())
                .sum(),
            subscribers,
            head_sequence: buffer.next_sequence,
        })
    }
}
