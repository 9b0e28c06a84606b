//! Module lifecycle state machine
//!
//! ```text
//! Uncreated --Create--> Created --Start--> Started
//!                          |                  |
//!                          |  Receive (loop)  |  Receive (loop)
//!                          +-----Destroy------+----> Destroyed
//! ```
//!
//! Start is optional and happens at most once; Destroyed is terminal.

use crate::gateway::error::LifecycleError;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ModuleState {
    Uncreated,
    Created,
    Started,
    Destroyed,
}

/// Entry point the host is about to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum LifecycleOp {
    Create,
    Start,
    Receive,
    Destroy,
}

/// Host-side tracker of one instance's state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lifecycle {
    module: String,
    state: ModuleState,
}

impl Lifecycle {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            state: ModuleState::Uncreated,
        }
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    /// Created or Started
    pub fn is_live(&self) -> bool {
        matches!(self.state, ModuleState::Created | ModuleState::Started)
    }

    /// State reached by calling `op` in `state`, `None` if the call is not allowed
    pub fn transition(state: ModuleState, op: LifecycleOp) -> Option<ModuleState> {
        use LifecycleOp::*;
        use ModuleState::*;

        match (state, op) {
            (Uncreated, Create) => Some(Created),
            (Created, Start) => Some(Started),
            (Created | Started, Receive) => Some(state),
            (Created | Started, Destroy) => Some(Destroyed),
            _ => None,
        }
    }

    /// Verify `op` is allowed now without changing state
    pub fn check(&self, op: LifecycleOp) -> Result<ModuleState, LifecycleError> {
        Self::transition(self.state, op).ok_or_else(|| LifecycleError::InvalidTransition {
            module: self.module.clone(),
            op,
            state: self.state,
        })
    }

    /// Record that `op` was performed
    pub fn apply(&mut self, op: LifecycleOp) -> Result<ModuleState, LifecycleError> {
        let next = self.check(op)?;
        if next != self.state {
            log::trace!("Module '{}': {} -> {}", self.module, self.state, next);
        }
        self.state = next;
        Ok(next)
    }
}
