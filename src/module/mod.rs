//! Module Plugin Contract
//!
//! Everything a module and a host must agree on to work together:
//!
//! - **Versioned API table**: Create, Destroy, Receive and an optional Start,
//!   tagged by a [`ModuleApiVersion`] stored at offset 0
//! - **Capability negotiation**: a GetApi entry point keyed by version
//! - **Opaque handles**: [`ModuleHandle`] is created by the module and only
//!   ever handed back to it
//! - **Static registration**: [`module_api!`](crate::module_api) exports
//!   `GetApi_<name>` and registers the module for lookup by name
//!
//! # Writing a Module
//!
//! ```rust
//! use modgate::broker::BrokerHandle;
//! use modgate::message::Message;
//! use modgate::module::{Module, ModuleConfig};
//!
//! struct Echo {
//!     broker: BrokerHandle,
//! }
//!
//! impl Module for Echo {
//!     fn create(broker: &BrokerHandle, _config: Option<&ModuleConfig>) -> Option<Self> {
//!         Some(Echo { broker: broker.clone() })
//!     }
//!
//!     fn receive(&self, message: &Message) {
//!         let _ = self.broker.publish(message.clone());
//!     }
//! }
//!
//! modgate::module_api!(Echo, echo);
//! ```

pub mod config;
pub mod error;
pub mod handle;
mod macros;
pub mod negotiate;
pub mod registry;
pub mod table;
pub mod traits;
pub mod version;

pub use config::ModuleConfig;
pub use error::{NegotiationError, NegotiationResult};
pub use handle::ModuleHandle;
pub use negotiate::{select_table, ModuleApi, ModuleGetApiFn, RawGetApiFn};
pub use registry::{
    find_static_module, resolve_get_api, static_get_api_name, static_modules, StaticModuleEntry,
    GET_API_PREFIX,
};
pub use table::{
    ModuleApiTable, ModuleApiV1, ModuleCreateFn, ModuleDestroyFn, ModuleReceiveFn, ModuleStartFn,
};
pub use traits::{Module, StartableModule};
pub use version::ModuleApiVersion;
