//! Opaque per-instance module state token

use std::ffi::c_void;
use std::fmt;
use std::mem::ManuallyDrop;
use std::ptr::NonNull;

/// Opaque handle to one module instance's state
///
/// Produced only by the module's Create and handed back to that same
/// module's Start, Receive and Destroy. The host stores and passes it but
/// never looks inside: there is no `Clone` and no accessor that works
/// without knowing the concrete state type.
///
/// Destroy takes the handle by value, so a handle cannot be destroyed twice.
/// A handle dropped without going through Destroy leaks the module state and
/// logs a warning.
#[repr(transparent)]
pub struct ModuleHandle(NonNull<c_void>);

// The handle is a token; synchronizing the state behind it is the module's job.
unsafe impl Send for ModuleHandle {}
unsafe impl Sync for ModuleHandle {}

impl ModuleHandle {
    /// Move module state to the heap and wrap it in a handle
    pub fn from_box<T: Send + Sync + 'static>(state: Box<T>) -> Self {
        Self(NonNull::from(Box::leak(state)).cast())
    }

    /// Borrow the module state
    ///
    /// # Safety
    ///
    /// The handle must have been produced by [`from_box`](Self::from_box)
    /// with the same `T`.
    pub unsafe fn state<T>(&self) -> &T {
        self.0.cast::<T>().as_ref()
    }

    /// Take the module state back, consuming the handle
    ///
    /// # Safety
    ///
    /// The handle must have been produced by [`from_box`](Self::from_box)
    /// with the same `T`.
    pub unsafe fn into_box<T>(self) -> Box<T> {
        let raw = self.into_raw();
        Box::from_raw(raw.cast::<T>().as_ptr())
    }

    /// Give up ownership without releasing the state
    pub fn into_raw(self) -> NonNull<c_void> {
        let this = ManuallyDrop::new(self);
        this.0
    }

    /// Rebuild a handle from a pointer produced by [`into_raw`](Self::into_raw)
    ///
    /// # Safety
    ///
    /// `ptr` must come from `into_raw` and must not be owned by another handle.
    pub unsafe fn from_raw(ptr: NonNull<c_void>) -> Self {
        Self(ptr)
    }
}

impl Drop for ModuleHandle {
    fn drop(&mut self) {
        log::warn!(
            "Module handle {:p} dropped without Destroy; module state leaked",
            self.0
        );
    }
}

impl fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleHandle({:p})", self.0)
    }
}
