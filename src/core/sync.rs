//! Lock helpers that turn poisoning into domain errors
//!
//! The broker and the gateway guard shared state with std locks. A poisoned
//! lock means some thread panicked while holding it; callers convert that into
//! their own error type instead of panicking a second time.

use std::sync::{LockResult, MutexGuard, RwLockReadGuard, RwLockWriteGuard};

/// Map a poisoned lock result into an application error
///
/// `lock_kind` names the lock flavour in the generated message.
pub fn handle_lock_poison<G, E>(
    result: LockResult<G>,
    lock_kind: &str,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<G, E> {
    result.map_err(|_| {
        error_constructor(format!(
            "Internal synchronisation error ({} poisoned): a thread panicked while holding the lock",
            lock_kind
        ))
    })
}

/// Mutex flavour of [`handle_lock_poison`]
///
/// # Examples
/// ```
/// use std::sync::Mutex;
/// use modgate::core::sync::handle_mutex_poison;
/// use modgate::broker::BrokerError;
///
/// let mutex = Mutex::new(42);
/// let guard = handle_mutex_poison(mutex.lock(), |message| BrokerError::OperationFailed {
///     message,
/// })
/// .unwrap();
/// assert_eq!(*guard, 42);
/// ```
pub fn handle_mutex_poison<'a, T, E>(
    result: LockResult<MutexGuard<'a, T>>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<MutexGuard<'a, T>, E> {
    handle_lock_poison(result, "mutex", error_constructor)
}

/// RwLock read flavour of [`handle_lock_poison`]
pub fn handle_rwlock_read<'a, T, E>(
    result: LockResult<RwLockReadGuard<'a, T>>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockReadGuard<'a, T>, E> {
    handle_lock_poison(result, "RwLock read", error_constructor)
}

/// RwLock write flavour of [`handle_lock_poison`]
pub fn handle_rwlock_write<'a, T, E>(
    result: LockResult<RwLockWriteGuard<'a, T>>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockWriteGuard<'a, T>, E> {
    handle_lock_poison(result, "RwLock write", error_constructor)
}
