//! Lock helpers that recover from poisoning.
//!
//! Critical sections in the store leave their data consistent between
//! statements; a poisoned lock is logged and used as-is.

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| {
        warn!("Recovered poisoned mutex");
        PoisonError::into_inner(e)
    })
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| {
        warn!("Recovered poisoned read lock");
        PoisonError::into_inner(e)
    })
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| {
        warn!("Recovered poisoned write lock");
        PoisonError::into_inner(e)
    })
}
