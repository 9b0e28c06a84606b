pub mod app;
pub mod broker;
pub mod core;
pub mod gateway;
pub mod message;
pub mod module;
pub mod modules;

// Used by `module_api!` expansions in other crates
pub use inventory;
