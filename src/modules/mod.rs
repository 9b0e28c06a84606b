//! Built-in Module Implementations
//!
//! Modules that ship with the gateway. Each one exports itself with
//! `module_api!`, so it is available by name without further registration.

pub mod hello_world;
pub mod logger;

pub use hello_world::HelloWorldModule;
pub use logger::LoggerModule;
