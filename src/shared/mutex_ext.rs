//! Usage: Poison-tolerant locking for the app's shared state (access gate, server list, transfers).
//!
//! A panic while one of these is held must not take every later command down with it: the gate
//! is a pair of flags and the list is re-fetched on the next load, so the inner value is reused.

use std::sync::{Mutex, MutexGuard};

pub(crate) trait MutexExt<T> {
    fn lock_or_recover(&self) -> MutexGuard<'_, T>;
}

impl<T> MutexExt<T> for Mutex<T> {
    #[track_caller]
    fn lock_or_recover(&self) -> MutexGuard<'_, T> {
        self.lock().unwrap_or_else(|poisoned| {
            let loc = std::panic::Location::caller();
            tracing::error!(
                state = std::any::type_name::<T>(),
                file = loc.file(),
                line = loc.line(),
                "shared state lock poisoned; continuing with last written value"
            );
            self.clear_poison();
            poisoned.into_inner()
        })
    }
}
