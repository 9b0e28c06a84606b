//! Broker Error Types

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("Broker is full (capacity: {capacity} messages)")]
    BrokerFull { capacity: usize },

    #[error("Subscriber not found: {subscriber_id}")]
    SubscriberNotFound { subscriber_id: u64 },

    #[error("Module '{module_name}' is detached from the broker")]
    Detached { module_name: String },

    #[error("Broker no longer exists")]
    BrokerGone,

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },
}

/// Result type for broker operations
pub type BrokerResult<T> = Result<T, BrokerError>;
