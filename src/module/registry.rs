//! Link-time registry of statically linked modules
//!
//! Every module exported with [`module_api!`](crate::module_api) submits a
//! [`StaticModuleEntry`] here. The host resolves modules by name, or by the
//! mangled `GetApi_<name>` entry point name, without any symbol lookup.

use crate::module::negotiate::{ModuleGetApiFn, RawGetApiFn};

/// Prefix of every module entry point name
pub const GET_API_PREFIX: &str = "GetApi_";

/// Registration record for one statically linked module type
pub struct StaticModuleEntry {
    /// Module name as written in the export macro
    pub name: &'static str,
    /// Exported entry point name, `GetApi_<name>`
    pub symbol: &'static str,
    pub get_api: ModuleGetApiFn,
    pub get_api_raw: RawGetApiFn,
}

inventory::collect!(StaticModuleEntry);

/// Entry point name for a statically linked module
pub fn static_get_api_name(module_name: &str) -> String {
    format!("{}{}", GET_API_PREFIX, module_name)
}

/// All registered modules, sorted by name
pub fn static_modules() -> Vec<&'static StaticModuleEntry> {
    let mut entries: Vec<_> = inventory::iter::<StaticModuleEntry>().collect();
    entries.sort_by_key(|entry| entry.name);
    entries
}

pub fn find_static_module(module_name: &str) -> Option<&'static StaticModuleEntry> {
    inventory::iter::<StaticModuleEntry>().find(|entry| entry.name == module_name)
}

/// Resolve a GetApi entry point by its mangled name
pub fn resolve_get_api(symbol: &str) -> Option<ModuleGetApiFn> {
    inventory::iter::<StaticModuleEntry>()
        .find(|entry| entry.symbol == symbol)
        .map(|entry| entry.get_api)
}

impl std::fmt::Debug for StaticModuleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticModuleEntry")
            .field("name", &self.name)
            .field("symbol", &self.symbol)
            .finish()
    }
}
