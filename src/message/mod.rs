//! Message Types for the Module Broker
//!
//! Messages are the opaque unit of data modules exchange through the broker.
//! A message carries a byte payload plus a string property map, and is
//! immutable once built. The payload is shared behind an `Arc`, so handing a
//! message to several modules never copies it, and a module that wants to keep
//! a message beyond a single Receive call simply clones it.
//!
//! # Example
//!
//! ```rust
//! use modgate::message::Message;
//!
//! let message = Message::builder()
//!     .content("temperature=21.5")
//!     .property("source", "sensor-1")
//!     .build();
//!
//! assert_eq!(message.property("source"), Some("sensor-1"));
//! assert_eq!(message.content(), b"temperature=21.5");
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::SystemTime;

/// Header information carried by every message
#[derive(Debug, Clone)]
pub struct MessageHeader {
    /// Timestamp when the message was built
    pub timestamp: SystemTime,
    /// Application-defined properties (opaque to the broker and the host)
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug)]
struct MessageInner {
    header: MessageHeader,
    content: Vec<u8>,
}

/// Immutable message exchanged between modules
///
/// Cloning a `Message` is a reference count increment; both clones observe
/// the same header and payload.
#[derive(Debug, Clone)]
pub struct Message {
    inner: Arc<MessageInner>,
}

impl Message {
    /// Create a message with the given payload and no properties
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self::builder().content(content).build()
    }

    /// Start building a message
    pub fn builder() -> MessageBuilder {
        MessageBuilder::new()
    }

    pub fn header(&self) -> &MessageHeader {
        &self.inner.header
    }

    pub fn content(&self) -> &[u8] {
        &self.inner.content
    }

    /// Payload as UTF-8, if it is valid UTF-8
    pub fn content_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.inner.content).ok()
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.inner.header.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.inner.header.properties.get(key).map(String::as_str)
    }

    pub fn timestamp(&self) -> SystemTime {
        self.inner.header.timestamp
    }

    /// Size of payload plus property keys and values, in bytes
    pub fn size_bytes(&self) -> usize {
        let properties: usize = self
            .inner
            .header
            .properties
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum();
        self.inner.content.len() + properties
    }

    /// True if both values refer to the same underlying message
    pub fn ptr_eq(&self, other: &Message) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Builder for [`Message`]
///
/// The builder is the only place a message can be mutated; `build()` freezes it.
#[derive(Debug, Default)]
pub struct MessageBuilder {
    content: Vec<u8>,
    properties: BTreeMap<String, String>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.content = content.into();
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn properties<I, K, V>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.properties
            .extend(properties.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn build(self) -> Message {
        Message {
            inner: Arc::new(MessageInner {
                header: MessageHeader {
                    timestamp: SystemTime::now(),
                    properties: self.properties,
                },
                content: self.content,
            }),
        }
    }
}
