//! Gateway Host
//!
//! The host side of the module contract: negotiates with modules, drives
//! their lifecycle, wires them to the broker and delivers messages.
//!
//! # Overview
//!
//! - [`Gateway`]: loads module instances and owns their lifecycle
//! - [`ModuleInstance`]: one instance with its lifecycle and call lock
//! - [`Lifecycle`]: the state machine every instance obeys
//! - [`GatewayConfig`]: TOML configuration of broker and module instances
//! - [`GatewayEvent`]: broadcast notifications about lifecycle changes
//!
//! # Concurrency
//!
//! Create, Start and Destroy run on the task that owns the gateway. Receive
//! runs on the Tokio blocking pool, one call at a time per instance. Before
//! Destroy the gateway detaches the module from the broker and waits for its
//! delivery worker, so Destroy never overlaps a Receive.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use modgate::gateway::{Gateway, GatewayConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::builtin_default();
//! let mut gateway = Gateway::from_config(&config).await?;
//! gateway.start()?;
//! // ... run until asked to stop
//! gateway.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod delivery;
pub mod error;
pub mod events;
pub mod instance;
pub mod lifecycle;
mod manager;

pub use config::{
    default_config_path, resolve_config_path, BrokerSettings, GatewayConfig, LoggingSettings,
    ModuleEntry,
};
pub use error::{ConfigError, GatewayError, GatewayResult, LifecycleError};
pub use events::{EventBus, GatewayEvent, GatewayEventType};
pub use instance::ModuleInstance;
pub use lifecycle::{Lifecycle, LifecycleOp, ModuleState};
pub use manager::{Gateway, ModuleId};
