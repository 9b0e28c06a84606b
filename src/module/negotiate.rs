//! Capability negotiation
//!
//! Module side: a GetApi entry point picks the highest table it has at or
//! below the version the host asks for, using [`select_table`].
//!
//! Host side: [`ModuleApi::negotiate`] calls GetApi with the host's highest
//! version, checks the answer and produces a validated, copyable set of entry
//! points in which the mandatory ones are no longer optional.

use crate::broker::BrokerHandle;
use crate::message::Message;
use crate::module::config::ModuleConfig;
use crate::module::error::{NegotiationError, NegotiationResult};
use crate::module::handle::ModuleHandle;
use crate::module::table::{
    ModuleApiTable, ModuleCreateFn, ModuleDestroyFn, ModuleReceiveFn, ModuleStartFn,
};
use crate::module::version::ModuleApiVersion;

/// Rust-ABI GetApi entry point
///
/// Returns the module's table for the highest supported version not above
/// the requested one, or `None` if there is no such version. Calling it has
/// no side effects and always yields the same static table for a request.
pub type ModuleGetApiFn = fn(ModuleApiVersion) -> Option<&'static ModuleApiTable>;

/// C-ABI GetApi entry point exported as `GetApi_<name>`
///
/// Takes the raw version number and returns null when negotiation fails.
#[allow(improper_ctypes_definitions)]
pub type RawGetApiFn = extern "C" fn(u32) -> *const ModuleApiTable;

/// Pick the table a module should answer GetApi with
///
/// A request above the module's highest version is an unrecognized forward
/// version and gets no table; otherwise the highest table at or below the
/// request wins.
pub fn select_table(
    requested: ModuleApiVersion,
    supported: &'static [ModuleApiTable],
) -> Option<&'static ModuleApiTable> {
    let highest = supported.iter().map(ModuleApiTable::version).max()?;
    if requested > highest {
        return None;
    }
    supported
        .iter()
        .filter(|table| table.version() <= requested)
        .max_by_key(|table| table.version())
}

/// Validated entry points of one module type
#[derive(Debug, Clone, Copy)]
pub struct ModuleApi {
    version: ModuleApiVersion,
    create: ModuleCreateFn,
    destroy: ModuleDestroyFn,
    receive: ModuleReceiveFn,
    start: Option<ModuleStartFn>,
}

impl ModuleApi {
    /// Ask a module for its table and validate the answer
    pub fn negotiate(
        get_api: ModuleGetApiFn,
        requested: ModuleApiVersion,
    ) -> NegotiationResult<Self> {
        let table = get_api(requested).ok_or(NegotiationError::NoTable { requested })?;
        Self::from_table(table, requested)
    }

    /// Same as [`negotiate`](Self::negotiate) through the C-ABI symbol
    pub fn negotiate_raw(get_api: RawGetApiFn, requested: ModuleApiVersion) -> NegotiationResult<Self> {
        let ptr = get_api(requested.as_u32());
        // SAFETY: GetApi symbols hand out pointers to static tables or null
        let table = unsafe { ModuleApiTable::from_raw(ptr, requested) }?;
        Self::from_table(table, requested)
    }

    /// Validate a table returned for `requested`
    pub fn from_table(table: &ModuleApiTable, requested: ModuleApiVersion) -> NegotiationResult<Self> {
        let version = table.version();
        if version > requested {
            return Err(NegotiationError::VersionTooNew {
                returned: version,
                requested,
            });
        }
        if version > ModuleApiVersion::CURRENT {
            return Err(NegotiationError::UnsupportedByHost {
                version,
                maximum: ModuleApiVersion::CURRENT,
            });
        }

        match table {
            ModuleApiTable::V1(v1) => match (v1.create, v1.destroy, v1.receive) {
                (Some(create), Some(destroy), Some(receive)) => Ok(Self {
                    version,
                    create,
                    destroy,
                    receive,
                    start: v1.start,
                }),
                _ => Err(NegotiationError::MissingEntry {
                    version,
                    entry: v1.missing_entry().unwrap_or("Create"),
                }),
            },
        }
    }

    pub fn version(&self) -> ModuleApiVersion {
        self.version
    }

    pub fn has_start(&self) -> bool {
        self.start.is_some()
    }

    pub fn create(&self, broker: &BrokerHandle, config: Option<&ModuleConfig>) -> Option<ModuleHandle> {
        (self.create)(broker, config)
    }

    /// Start the instance; does nothing for modules without a Start entry
    pub fn start(&self, handle: &ModuleHandle) {
        if let Some(start) = self.start {
            start(handle);
        }
    }

    pub fn receive(&self, handle: &ModuleHandle, message: &Message) {
        (self.receive)(handle, message)
    }

    pub fn destroy(&self, handle: Option<ModuleHandle>) {
        (self.destroy)(handle)
    }
}
