//! Authoring traits for module implementations
//!
//! A module implements [`Module`] (and [`StartableModule`] if it needs a
//! Start entry point), then exports itself with [`module_api!`](crate::module_api).
//! The macro builds the API table from the trait methods, so the raw handle
//! and table plumbing never shows up in module code.

use crate::broker::BrokerHandle;
use crate::message::Message;
use crate::module::config::ModuleConfig;

/// A module that can be created, fed messages and destroyed
///
/// The instance is shared between the host's worker threads, hence
/// `Send + Sync`. Receive takes `&self`: any mutable state needs its own
/// synchronization, but the host never calls Receive re-entrantly for one
/// instance.
pub trait Module: Send + Sync + Sized + 'static {
    /// Build a new instance
    ///
    /// The broker handle stays valid until Destroy; clone it to publish
    /// outside of Create. Returning `None` reports a creation failure and the
    /// host will not call anything else on this instance.
    fn create(broker: &BrokerHandle, config: Option<&ModuleConfig>) -> Option<Self>;

    /// Handle one message
    ///
    /// The message is only borrowed for the call; clone it to keep it.
    fn receive(&self, message: &Message);

    /// Release resources; called exactly once
    fn destroy(self) {}
}

/// A module with a Start entry point
///
/// Start is called at most once, after Create, when the host has finished
/// wiring every module. Receive calls may already have happened by then.
pub trait StartableModule: Module {
    fn start(&self);
}
