//! Page-scoped stores.
//!
//! Each store owns the data one view needs, orchestrates the service calls
//! that fill it and, where the view supports back navigation, persists a
//! snapshot to session storage.

pub mod async_action;
pub mod detail;
pub mod home;
pub mod navigation;
pub mod resource;
pub mod search;
pub mod task;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use crate::constants::intervals;

pub use async_action::AsyncAction;
pub use detail::AnimeDetailStore;
pub use home::HomeStore;
pub use navigation::{Location, NavigationStore};
pub use resource::ResourceStore;
pub use search::SearchStore;
pub use task::{CloseReason, TaskActions, TaskEvent, TaskStore};

/// Timing knobs shared by the persisting stores.
#[derive(Debug, Clone, Copy)]
pub struct StoreSettings {
    /// How long a loaded calendar counts as fresh.
    pub calendar_ttl: Duration,

    /// Quiet period before a snapshot is written to session storage.
    pub persist_debounce: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            calendar_ttl: intervals::CALENDAR_CACHE_TTL,
            persist_debounce: intervals::PERSIST_DEBOUNCE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Empty,
    Loading,
    Ready,
    Failed(String),
}

impl LoadState {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}
