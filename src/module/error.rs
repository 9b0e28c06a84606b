//! Module API Error Types

use crate::module::version::ModuleApiVersion;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NegotiationError {
    #[error("Module offers no API table for version {requested} or lower")]
    NoTable { requested: ModuleApiVersion },

    #[error("Module returned a {returned} table when {requested} was requested")]
    VersionTooNew {
        returned: ModuleApiVersion,
        requested: ModuleApiVersion,
    },

    #[error("API {version} is not supported by this host (maximum {maximum})")]
    UnsupportedByHost {
        version: ModuleApiVersion,
        maximum: ModuleApiVersion,
    },

    #[error("API table carries unknown version tag {tag}")]
    UnknownTableVersion { tag: u32 },

    #[error("API {version} table is missing mandatory entry '{entry}'")]
    MissingEntry {
        version: ModuleApiVersion,
        entry: &'static str,
    },
}

pub type NegotiationResult<T> = Result<T, NegotiationError>;
