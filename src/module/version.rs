//! Module API version numbers

use std::fmt;

/// Version of the module API table layout
///
/// Versions form an ordered, growing set. Only [`V1`](Self::V1) is defined
/// today, but any `u32` can be expressed so a host can ask for a version a
/// module has never heard of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ModuleApiVersion(u32);

impl ModuleApiVersion {
    pub const V1: ModuleApiVersion = ModuleApiVersion(1);

    /// Highest version this build of the crate understands
    pub const CURRENT: ModuleApiVersion = Self::V1;

    /// Every version this build understands, lowest first
    pub const KNOWN: &'static [ModuleApiVersion] = &[Self::V1];

    pub const fn new(version: u32) -> Self {
        Self(version)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// True if this build has a table layout for the version
    pub fn is_known(self) -> bool {
        Self::KNOWN.contains(&self)
    }
}

impl Default for ModuleApiVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl From<u32> for ModuleApiVersion {
    fn from(version: u32) -> Self {
        Self(version)
    }
}

impl fmt::Display for ModuleApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}
