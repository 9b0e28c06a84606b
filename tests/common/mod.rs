//! Common test utilities and helpers
//!
//! An instrumented module that records every call it receives into a
//! [`Probe`] looked up by name from its configuration. Each test uses its own
//! probe key, so tests can run in parallel.

#![allow(dead_code)]

use modgate::broker::BrokerHandle;
use modgate::message::Message;
use modgate::module::{
    select_table, Module, ModuleApiTable, ModuleApiV1, ModuleApiVersion, ModuleConfig,
    StartableModule,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// What an instrumented module observed
#[derive(Debug, Default)]
pub struct Probe {
    pub created: AtomicUsize,
    pub started: AtomicUsize,
    pub destroyed: AtomicUsize,
    /// Receive calls currently executing
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
    /// Set when Destroy ran while a Receive was executing
    pub destroy_overlapped_receive: AtomicBool,
    /// Set when Receive ran after Destroy
    pub receive_after_destroy: AtomicBool,
    pub messages: Mutex<Vec<String>>,
    pub spans: Mutex<Vec<(Instant, Instant)>>,
}

impl Probe {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn received(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    /// True if any two recorded Receive spans overlap
    pub fn spans_overlap(&self) -> bool {
        let mut spans = self.spans.lock().unwrap().clone();
        spans.sort_by_key(|(start, _)| *start);
        spans.windows(2).any(|pair| pair[1].0 < pair[0].1)
    }
}

static PROBES: Mutex<BTreeMap<String, Arc<Probe>>> = Mutex::new(BTreeMap::new());

pub fn probe(key: &str) -> Arc<Probe> {
    let mut probes = PROBES.lock().unwrap();
    Arc::clone(probes.entry(key.to_string()).or_default())
}

#[derive(Debug, Deserialize)]
struct InstrumentedArgs {
    probe: String,
    #[serde(default)]
    receive_delay_ms: u64,
    #[serde(default)]
    fail_create: bool,
    #[serde(default)]
    publish_on_start: Option<String>,
}

/// Module that records its lifecycle into a probe
pub struct Instrumented {
    probe: Arc<Probe>,
    broker: BrokerHandle,
    receive_delay: Duration,
    publish_on_start: Option<String>,
    destroying: AtomicBool,
}

impl Module for Instrumented {
    fn create(broker: &BrokerHandle, config: Option<&ModuleConfig>) -> Option<Self> {
        let args: InstrumentedArgs = config?.deserialize().ok()?;
        if args.fail_create {
            return None;
        }
        let probe = probe(&args.probe);
        probe.created.fetch_add(1, Ordering::SeqCst);
        Some(Instrumented {
            probe,
            broker: broker.clone(),
            receive_delay: Duration::from_millis(args.receive_delay_ms),
            publish_on_start: args.publish_on_start,
            destroying: AtomicBool::new(false),
        })
    }

    fn receive(&self, message: &Message) {
        let entered = Instant::now();
        if self.destroying.load(Ordering::SeqCst) {
            self.probe.receive_after_destroy.store(true, Ordering::SeqCst);
        }
        let active = self.probe.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.max_active.fetch_max(active, Ordering::SeqCst);

        if !self.receive_delay.is_zero() {
            std::thread::sleep(self.receive_delay);
        }
        self.probe
            .messages
            .lock()
            .unwrap()
            .push(message.content_str().unwrap_or("<binary>").to_string());

        self.probe.active.fetch_sub(1, Ordering::SeqCst);
        self.probe
            .spans
            .lock()
            .unwrap()
            .push((entered, Instant::now()));
    }

    fn destroy(self) {
        self.destroying.store(true, Ordering::SeqCst);
        if self.probe.active.load(Ordering::SeqCst) > 0 {
            self.probe
                .destroy_overlapped_receive
                .store(true, Ordering::SeqCst);
        }
        self.probe.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

impl StartableModule for Instrumented {
    fn start(&self) {
        self.probe.started.fetch_add(1, Ordering::SeqCst);
        if let Some(text) = &self.publish_on_start {
            let _ = self.broker.publish(Message::new(text.as_str()));
        }
    }
}

modgate::module_api!(Instrumented, instrumented, startable);

static V1_NO_START: [ModuleApiTable; 1] = [ModuleApiTable::V1(ModuleApiV1::of::<Instrumented>())];

/// GetApi of a V1-only module without a Start entry point
pub fn v1_only_get_api(requested: ModuleApiVersion) -> Option<&'static ModuleApiTable> {
    select_table(requested, &V1_NO_START)
}

/// Configuration for an instrumented module
pub fn probe_config(key: &str) -> ModuleConfig {
    probe_config_with(key, "")
}

/// Configuration with extra TOML lines appended
pub fn probe_config_with(key: &str, extra: &str) -> ModuleConfig {
    ModuleConfig::from_toml_str(&format!("probe = \"{}\"\n{}", key, extra)).unwrap()
}

/// Poll `condition` for up to two seconds
pub async fn wait_for(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
