//! Hello World Module - publish a greeting on a fixed interval
//!
//! Once started, a background thread publishes `"hello world"` with the
//! property `source=hello_world` every `interval_ms` milliseconds (default
//! 5000). Destroy stops the thread and waits for it.

use crate::broker::{BrokerError, BrokerHandle};
use crate::message::Message;
use crate::module::{Module, ModuleConfig, StartableModule};
use serde::Deserialize;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

pub const DEFAULT_INTERVAL_MS: u64 = 5000;
pub const GREETING: &str = "hello world";

#[derive(Debug, Deserialize)]
#[serde(default)]
struct HelloWorldArgs {
    interval_ms: u64,
}

impl Default for HelloWorldArgs {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopSignal {
    fn stop(&self) {
        match self.stopped.lock() {
            Ok(mut stopped) => *stopped = true,
            Err(poisoned) => *poisoned.into_inner() = true,
        }
        self.wake.notify_all();
    }

    /// Sleep up to `interval`; true if asked to stop
    fn wait(&self, interval: Duration) -> bool {
        let Ok(stopped) = self.stopped.lock() else {
            return true;
        };
        match self
            .wake
            .wait_timeout_while(stopped, interval, |stopped| !*stopped)
        {
            Ok((stopped, _)) => *stopped,
            Err(_) => true,
        }
    }
}

pub struct HelloWorldModule {
    broker: BrokerHandle,
    interval: Duration,
    signal: Arc<StopSignal>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl HelloWorldModule {
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn greeting() -> Message {
        Message::builder()
            .content(GREETING)
            .property("source", "hello_world")
            .build()
    }

    fn run(broker: BrokerHandle, interval: Duration, signal: Arc<StopSignal>) {
        while !signal.wait(interval) {
            match broker.publish(Self::greeting()) {
                Ok(_) => {}
                Err(BrokerError::Detached { .. }) | Err(BrokerError::BrokerGone) => break,
                Err(e) => log::warn!("hello_world: publish failed: {}", e),
            }
        }
        log::trace!("hello_world: publisher thread exiting");
    }
}

impl Module for HelloWorldModule {
    fn create(broker: &BrokerHandle, config: Option<&ModuleConfig>) -> Option<Self> {
        let args = match config.map(ModuleConfig::deserialize::<HelloWorldArgs>) {
            Some(Ok(args)) => args,
            Some(Err(e)) => {
                log::error!("hello_world: invalid configuration: {}", e);
                return None;
            }
            None => HelloWorldArgs::default(),
        };
        if args.interval_ms == 0 {
            log::error!("hello_world: interval_ms must be greater than zero");
            return None;
        }

        Some(HelloWorldModule {
            broker: broker.clone(),
            interval: Duration::from_millis(args.interval_ms),
            signal: Arc::new(StopSignal::default()),
            worker: Mutex::new(None),
        })
    }

    fn receive(&self, message: &Message) {
        log::trace!(
            "hello_world: ignoring message of {} bytes",
            message.content().len()
        );
    }

    fn destroy(self) {
        self.signal.stop();
        let worker = match self.worker.into_inner() {
            Ok(worker) => worker,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(worker) = worker {
            if worker.join().is_err() {
                log::error!("hello_world: publisher thread panicked");
            }
        }
    }
}

impl StartableModule for HelloWorldModule {
    fn start(&self) {
        let mut worker = match self.worker.lock() {
            Ok(worker) => worker,
            Err(poisoned) => poisoned.into_inner(),
        };
        if worker.is_some() {
            return;
        }

        let broker = self.broker.clone();
        let interval = self.interval;
        let signal = Arc::clone(&self.signal);
        match std::thread::Builder::new()
            .name("hello_world".to_string())
            .spawn(move || Self::run(broker, interval, signal))
        {
            Ok(handle) => *worker = Some(handle),
            Err(e) => log::error!("hello_world: cannot start publisher thread: {}", e),
        }
    }
}

crate::module_api!(HelloWorldModule, hello_world, startable);
