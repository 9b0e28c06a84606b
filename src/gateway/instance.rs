//! One live module instance on the host side
//!
//! Pairs the negotiated entry points with the module's handle and enforces
//! the lifecycle on every call. All calls into the module take the instance
//! lock, so Receive is never re-entered for the same instance and Destroy
//! cannot overlap a Receive that is still running.
//!
//! Module code runs behind `catch_unwind`. A panic in Create is a creation
//! failure; panics in the other entry points are logged and absorbed.

use crate::broker::BrokerHandle;
use crate::core::sync::handle_mutex_poison;
use crate::gateway::error::{GatewayError, GatewayResult};
use crate::gateway::lifecycle::{Lifecycle, LifecycleOp, ModuleState};
use crate::message::Message;
use crate::module::{ModuleApi, ModuleConfig, ModuleHandle};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard};

struct InstanceSlot {
    lifecycle: Lifecycle,
    handle: Option<ModuleHandle>,
}

pub struct ModuleInstance {
    name: String,
    module: String,
    api: ModuleApi,
    broker: BrokerHandle,
    slot: Mutex<InstanceSlot>,
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl ModuleInstance {
    /// Call the module's Create
    ///
    /// On failure nothing else is ever called for this instance.
    pub fn create(
        name: &str,
        module: &str,
        api: ModuleApi,
        broker: BrokerHandle,
        config: Option<&ModuleConfig>,
    ) -> GatewayResult<Self> {
        let mut lifecycle = Lifecycle::new(name);
        lifecycle.check(LifecycleOp::Create)?;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| api.create(&broker, config)));
        let handle = match outcome {
            Ok(Some(handle)) => handle,
            Ok(None) => {
                return Err(GatewayError::CreateFailed {
                    module: name.to_string(),
                    reason: "Create returned no handle".to_string(),
                })
            }
            Err(payload) => {
                return Err(GatewayError::CreateFailed {
                    module: name.to_string(),
                    reason: format!("Create panicked: {}", panic_message(payload.as_ref())),
                })
            }
        };
        lifecycle.apply(LifecycleOp::Create)?;

        log::debug!(
            "Created module instance '{}' ({}, API {})",
            name,
            module,
            api.version()
        );
        Ok(Self {
            name: name.to_string(),
            module: module.to_string(),
            api,
            broker,
            slot: Mutex::new(InstanceSlot {
                lifecycle,
                handle: Some(handle),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Module type the instance was created from
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn api(&self) -> &ModuleApi {
        &self.api
    }

    pub fn broker(&self) -> &BrokerHandle {
        &self.broker
    }

    pub fn state(&self) -> ModuleState {
        match self.slot.lock() {
            Ok(slot) => slot.lifecycle.state(),
            Err(poisoned) => poisoned.into_inner().lifecycle.state(),
        }
    }

    fn lock(&self) -> GatewayResult<MutexGuard<'_, InstanceSlot>> {
        handle_mutex_poison(self.slot.lock(), |message| GatewayError::Internal { message })
    }

    fn absorb_panic(&self, op: LifecycleOp, call: impl FnOnce()) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(call)) {
            log::error!(
                "Module '{}' panicked in {}: {}",
                self.name,
                op,
                panic_message(payload.as_ref())
            );
        }
    }

    /// Call Start, or just record the transition if the module has none
    pub fn start(&self) -> GatewayResult<()> {
        let mut slot = self.lock()?;
        slot.lifecycle.check(LifecycleOp::Start)?;
        if let Some(handle) = slot.handle.as_ref() {
            if self.api.has_start() {
                self.absorb_panic(LifecycleOp::Start, || self.api.start(handle));
            }
        }
        slot.lifecycle.apply(LifecycleOp::Start)?;
        log::debug!("Started module instance '{}'", self.name);
        Ok(())
    }

    /// Deliver one message
    pub fn receive(&self, message: &Message) -> GatewayResult<()> {
        let slot = self.lock()?;
        slot.lifecycle.check(LifecycleOp::Receive)?;
        if let Some(handle) = slot.handle.as_ref() {
            self.absorb_panic(LifecycleOp::Receive, || self.api.receive(handle, message));
        }
        Ok(())
    }

    /// Call Destroy; the handle is consumed and the instance becomes terminal
    pub fn destroy(&self) -> GatewayResult<()> {
        let mut slot = self.lock()?;
        slot.lifecycle.check(LifecycleOp::Destroy)?;
        let handle = slot.handle.take();
        slot.lifecycle.apply(LifecycleOp::Destroy)?;
        self.absorb_panic(LifecycleOp::Destroy, || self.api.destroy(handle));
        log::debug!("Destroyed module instance '{}'", self.name);
        Ok(())
    }
}

impl Drop for ModuleInstance {
    fn drop(&mut self) {
        let slot = match self.slot.get_mut() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !slot.lifecycle.is_live() {
            return;
        }

        log::warn!(
            "Module instance '{}' dropped while {}; destroying it",
            self.name,
            slot.lifecycle.state()
        );
        let handle = slot.handle.take();
        let _ = slot.lifecycle.apply(LifecycleOp::Destroy);
        let api = self.api;
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| api.destroy(handle))) {
            log::error!(
                "Module '{}' panicked in destroy: {}",
                self.name,
                panic_message(payload.as_ref())
            );
        }
    }
}

impl std::fmt::Debug for ModuleInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleInstance")
            .field("name", &self.name)
            .field("module", &self.module)
            .field("version", &self.api.version())
            .field("state", &self.state())
            .finish()
    }
}
