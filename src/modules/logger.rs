//! Logger Module - log every message that passes through the broker
//!
//! Has no Start entry point. Each received message is written to the log as
//! one JSON object with its timestamp, properties and payload size.

use crate::broker::BrokerHandle;
use crate::message::Message;
use crate::module::{Module, ModuleConfig};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default, Deserialize)]
struct LoggerArgs {
    #[serde(default)]
    prefix: Option<String>,
}

#[derive(Debug)]
pub struct LoggerModule {
    prefix: String,
    received: AtomicU64,
}

impl LoggerModule {
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// One-line JSON rendering of a message
    pub fn format_message(&self, message: &Message) -> String {
        let duration = message
            .timestamp()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();
        let datetime = DateTime::<Utc>::from_timestamp(
            duration.as_secs() as i64,
            duration.subsec_nanos(),
        )
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        let mut obj = Map::new();
        obj.insert("prefix".into(), json!(self.prefix));
        obj.insert("timestamp".into(), json!(datetime.to_rfc3339()));
        obj.insert("properties".into(), json!(message.properties()));
        obj.insert("size".into(), json!(message.content().len()));
        if let Some(text) = message.content_str() {
            obj.insert("content".into(), json!(text));
        }
        Value::Object(obj).to_string()
    }
}

impl Module for LoggerModule {
    fn create(_broker: &BrokerHandle, config: Option<&ModuleConfig>) -> Option<Self> {
        let args = match config {
            Some(config) => match config.deserialize::<LoggerArgs>() {
                Ok(args) => args,
                Err(e) => {
                    log::error!("logger: invalid configuration: {}", e);
                    return None;
                }
            },
            None => LoggerArgs::default(),
        };
        Some(LoggerModule {
            prefix: args.prefix.unwrap_or_else(|| "logger".to_string()),
            received: AtomicU64::new(0),
        })
    }

    fn receive(&self, message: &Message) {
        self.received.fetch_add(1, Ordering::Relaxed);
        log::info!("{}", self.format_message(message));
    }

    fn destroy(self) {
        log::debug!(
            "logger '{}' destroyed after {} messages",
            self.prefix,
            self.received()
        );
    }
}

crate::module_api!(LoggerModule, logger);
