use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

use crate::room::RoomId;

/// Failures reported synchronously by join, leave and send.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("{participant} is not in a room")]
    NotInRoom { participant: String },

    #[error("{participant} has left and can no longer join rooms")]
    ParticipantClosed { participant: String },

    #[error("Name {name} is already taken in room {room}")]
    NameTaken { room: RoomId, name: String },

    #[error("Room {room} is closed")]
    RoomClosed { room: RoomId },
}

// A panicking reaction never holds these locks, but a poisoned guard still
// protects consistent data, so recover it instead of propagating the panic.

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
