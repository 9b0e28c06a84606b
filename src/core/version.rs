//! Build metadata shared by the CLI and the host.
//! The generated version.rs comes from build.rs and reads `module_api_version`
//! from `[package.metadata]` in Cargo.toml.

use crate::module::version::ModuleApiVersion;

include!(concat!(env!("OUT_DIR"), "/version.rs"));

/// Module API version declared in Cargo.toml metadata.
/// Falls back to the compiled-in current version if the metadata is missing.
pub fn declared_api_version() -> ModuleApiVersion {
    MODULE_API_VERSION
        .parse::<u32>()
        .map(ModuleApiVersion::new)
        .unwrap_or(ModuleApiVersion::CURRENT)
}

/// Build time string from the build script (UTC)
pub fn build_time() -> &'static str {
    BUILD_TIME
}

/// Short git hash captured by the build script
pub fn git_hash() -> &'static str {
    GIT_HASH
}

/// Long version string for `--version`
pub fn long_version() -> String {
    format!(
        "{} (module API v{}, built {}, git {})",
        env!("CARGO_PKG_VERSION"),
        declared_api_version().as_u32(),
        build_time(),
        git_hash()
    )
}
