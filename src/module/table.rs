//! Versioned module API tables
//!
//! A module describes its capabilities with one static [`ModuleApiTable`]
//! per supported version. The table is a tagged union whose `u32` version
//! tag sits at offset 0, so a host can read the tag from a raw pointer before
//! it commits to interpreting the rest of the layout.

use crate::broker::BrokerHandle;
use crate::message::Message;
use crate::module::config::ModuleConfig;
use crate::module::error::{NegotiationError, NegotiationResult};
use crate::module::handle::ModuleHandle;
use crate::module::traits::{Module, StartableModule};
use crate::module::version::ModuleApiVersion;

/// Create: build an instance, `None` on failure
pub type ModuleCreateFn = fn(&BrokerHandle, Option<&ModuleConfig>) -> Option<ModuleHandle>;
/// Destroy: release an instance; `None` is a no-op
pub type ModuleDestroyFn = fn(Option<ModuleHandle>);
/// Receive: handle one message
pub type ModuleReceiveFn = fn(&ModuleHandle, &Message);
/// Start: begin background activity
pub type ModuleStartFn = fn(&ModuleHandle);

/// Version 1 entry points
///
/// Create, Destroy and Receive are mandatory; a table missing any of them is
/// malformed and rejected during negotiation. Start is optional.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ModuleApiV1 {
    pub create: Option<ModuleCreateFn>,
    pub destroy: Option<ModuleDestroyFn>,
    pub receive: Option<ModuleReceiveFn>,
    pub start: Option<ModuleStartFn>,
}

impl ModuleApiV1 {
    /// Table for a module without a Start entry point
    pub const fn of<M: Module>() -> Self {
        Self {
            create: Some(create_shim::<M> as ModuleCreateFn),
            destroy: Some(destroy_shim::<M> as ModuleDestroyFn),
            receive: Some(receive_shim::<M> as ModuleReceiveFn),
            start: None,
        }
    }

    /// Table for a module with a Start entry point
    pub const fn of_startable<M: StartableModule>() -> Self {
        Self {
            create: Some(create_shim::<M> as ModuleCreateFn),
            destroy: Some(destroy_shim::<M> as ModuleDestroyFn),
            receive: Some(receive_shim::<M> as ModuleReceiveFn),
            start: Some(start_shim::<M> as ModuleStartFn),
        }
    }

    /// Name of the first missing mandatory entry
    pub fn missing_entry(&self) -> Option<&'static str> {
        if self.create.is_none() {
            Some("Create")
        } else if self.destroy.is_none() {
            Some("Destroy")
        } else if self.receive.is_none() {
            Some("Receive")
        } else {
            None
        }
    }
}

/// API table tagged by version
#[repr(u32)]
#[derive(Debug, Clone, Copy)]
pub enum ModuleApiTable {
    V1(ModuleApiV1) = 1,
}

impl ModuleApiTable {
    pub fn version(&self) -> ModuleApiVersion {
        match self {
            ModuleApiTable::V1(_) => ModuleApiVersion::V1,
        }
    }

    pub fn as_v1(&self) -> Option<&ModuleApiV1> {
        match self {
            ModuleApiTable::V1(table) => Some(table),
        }
    }

    /// Interpret a table handed over through the C-ABI `GetApi_<name>` symbol
    ///
    /// The version tag is read on its own first; a tag this build does not
    /// know is refused without touching the rest of the table.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must point to memory that starts with a `u32` tag and
    /// that, for a known tag, holds a valid table of that version for `'a`.
    pub unsafe fn from_raw<'a>(
        ptr: *const ModuleApiTable,
        requested: ModuleApiVersion,
    ) -> NegotiationResult<&'a ModuleApiTable> {
        if ptr.is_null() {
            return Err(NegotiationError::NoTable { requested });
        }
        let tag = ptr.cast::<u32>().read();
        if !ModuleApiVersion::new(tag).is_known() {
            return Err(NegotiationError::UnknownTableVersion { tag });
        }
        Ok(&*ptr)
    }
}

fn create_shim<M: Module>(
    broker: &BrokerHandle,
    config: Option<&ModuleConfig>,
) -> Option<ModuleHandle> {
    M::create(broker, config).map(|module| ModuleHandle::from_box(Box::new(module)))
}

fn destroy_shim<M: Module>(handle: Option<ModuleHandle>) {
    if let Some(handle) = handle {
        // SAFETY: handles reaching this table were produced by create_shim::<M>
        let module = unsafe { handle.into_box::<M>() };
        (*module).destroy();
    }
}

fn receive_shim<M: Module>(handle: &ModuleHandle, message: &Message) {
    // SAFETY: as above
    let module = unsafe { handle.state::<M>() };
    module.receive(message);
}

fn start_shim<M: StartableModule>(handle: &ModuleHandle) {
    // SAFETY: as above
    let module = unsafe { handle.state::<M>() };
    module.start();
}
