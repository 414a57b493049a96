use std::sync::{Mutex, MutexGuard, PoisonError};

mod database;
mod user;

pub use database::InMemoryStorage;
pub use user::{AuthenticatedUser, UserResponse};

// Every guarded structure here is left consistent between statements, so a
// poisoned lock is still safe to use
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
