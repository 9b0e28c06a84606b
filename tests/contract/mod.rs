//! Module contract test modules

pub mod concurrency;
pub mod negotiation;
