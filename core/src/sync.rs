use std::sync::{Mutex, MutexGuard};

/// Acquire a mutex, recovering the data if a previous holder panicked.
///
/// Every critical section in this crate leaves its map in a consistent state
/// before any call that could panic, so the inner value is still valid.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
