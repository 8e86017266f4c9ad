//! Lock helpers shared by coordinators and nodes.
//!
//! A panic while a routing pass holds a lock must not wedge every later
//! pass, so poisoned guards are recovered and the event is logged.

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

#[inline]
pub(crate) fn lock_mutex<'a, T>(mutex: &'a Mutex<T>, owner: &str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
        warn!(owner, "Recovering poisoned mutex");
        poisoned.into_inner()
    })
}

#[inline]
pub(crate) fn read_lock<'a, T>(rwlock: &'a RwLock<T>, owner: &str) -> RwLockReadGuard<'a, T> {
    rwlock.read().unwrap_or_else(|poisoned: PoisonError<_>| {
        warn!(owner, "Recovering poisoned read lock");
        poisoned.into_inner()
    })
}

#[inline]
pub(crate) fn write_lock<'a, T>(rwlock: &'a RwLock<T>, owner: &str) -> RwLockWriteGuard<'a, T> {
    rwlock.write().unwrap_or_else(|poisoned: PoisonError<_>| {
        warn!(owner, "Recovering poisoned write lock");
        poisoned.into_inner()
    })
}
