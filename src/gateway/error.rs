//! Gateway Error Types

use crate::broker::BrokerError;
use crate::core::error_handling::ContextualError;
use crate::gateway::lifecycle::{LifecycleOp, ModuleState};
use crate::module::NegotiationError;
use std::path::PathBuf;

/// Illegal lifecycle transition
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LifecycleError {
    #[error("Module '{module}': {op} is not allowed in state {state}")]
    InvalidTransition {
        module: String,
        op: LifecycleOp,
        state: ModuleState,
    },
}

/// Gateway configuration problems
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read configuration file '{}': {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("Invalid configuration syntax in '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    fn message(&self) -> &str {
        match self {
            ConfigError::Io { message, .. }
            | ConfigError::Parse { message, .. }
            | ConfigError::Invalid { message } => message,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Negotiation with module '{module}' failed: {source}")]
    Negotiation {
        module: String,
        #[source]
        source: NegotiationError,
    },

    #[error("Module '{module}' failed to create: {reason}")]
    CreateFailed { module: String, reason: String },

    #[error("Unknown module type '{module}' (no GetApi_{module} entry point)")]
    UnknownModule { module: String },

    #[error("Module instance '{name}' is already loaded")]
    DuplicateInstance { name: String },

    #[error("No module instance '{name}'")]
    InstanceNotFound { name: String },

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Gateway has been shut down")]
    ShutDown,

    #[error("Internal gateway error: {message}")]
    Internal { message: String },
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl ContextualError for GatewayError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, GatewayError::Config(_))
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            GatewayError::Config(config) => Some(config.message()),
            _ => None,
        }
    }
}

impl ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        Some(self.message())
    }
}
