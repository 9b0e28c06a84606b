//! Fatal error reporting for the CLI
//!
//! Errors that end the process are logged through one function so the user
//! sees a single `FATAL:` line, with the full detail available at debug level.

/// Errors that know whether their message is meant for the user
///
/// When `is_user_actionable()` is true, `user_message()` returns the text to
/// show (for example a configuration mistake). System errors return `None` and
/// the caller's operation context is shown instead.
pub trait ContextualError: std::error::Error {
    fn is_user_actionable(&self) -> bool;

    fn user_message(&self) -> Option<&str>;
}

/// Log an error with the detail level its kind deserves
pub fn log_error_with_context<E: ContextualError>(error: &E, operation_context: &str) {
    let headline = error
        .user_message()
        .filter(|_| error.is_user_actionable())
        .unwrap_or(operation_context);
    log::error!("FATAL: {}", headline);
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
