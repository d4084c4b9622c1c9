//! Airing calendar with a short-lived cache and a restorable snapshot.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{LoadState, StoreSettings, read, write};
use crate::constants::{messages, storage::HOME_STATE_KEY};
use crate::error::Result;
use crate::models::CalendarDay;
use crate::services::BangumiApi;
use crate::storage::{self, SessionStorage};
use crate::timer::Debouncer;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct HomeSnapshot {
    scroll_position: f64,
    calendar_data: Vec<CalendarDay>,
    /// Milliseconds since the epoch.
    last_load_time: Option<i64>,
}

#[derive(Debug, Default)]
struct HomeState {
    calendar: Vec<CalendarDay>,
    scroll_position: f64,
    last_load_time: Option<i64>,
    load: LoadState,
}

impl HomeState {
    fn snapshot(&self) -> HomeSnapshot {
        HomeSnapshot {
            scroll_position: self.scroll_position,
            calendar_data: self.calendar.clone(),
            last_load_time: self.last_load_time,
        }
    }
}

pub struct HomeStore {
    api: Arc<dyn BangumiApi>,
    storage: Arc<dyn SessionStorage>,
    state: Arc<RwLock<HomeState>>,
    persist: Debouncer,
    settings: StoreSettings,
}

impl HomeStore {
    #[must_use]
    pub fn new(
        api: Arc<dyn BangumiApi>,
        storage: Arc<dyn SessionStorage>,
        settings: StoreSettings,
    ) -> Self {
        Self {
            api,
            storage,
            state: Arc::new(RwLock::new(HomeState::default())),
            persist: Debouncer::new(settings.persist_debounce),
            settings,
        }
    }

    #[must_use]
    pub fn calendar(&self) -> Vec<CalendarDay> {
        read(&self.state).calendar.clone()
    }

    #[must_use]
    pub fn load_state(&self) -> LoadState {
        read(&self.state).load.clone()
    }

    #[must_use]
    pub fn scroll_position(&self) -> f64 {
        read(&self.state).scroll_position
    }

    #[must_use]
    pub fn last_load_time(&self) -> Option<i64> {
        read(&self.state).last_load_time
    }

    pub fn set_scroll_position(&self, position: f64) {
        write(&self.state).scroll_position = position;
        self.schedule_persist();
    }

    /// True when a non-empty calendar was loaded within the cache window.
    #[must_use]
    pub fn is_cache_valid(&self) -> bool {
        self.is_cache_valid_at(Utc::now().timestamp_millis())
    }

    #[must_use]
    pub fn is_cache_valid_at(&self, now_ms: i64) -> bool {
        let state = read(&self.state);
        let ttl_ms = i64::try_from(self.settings.calendar_ttl.as_millis()).unwrap_or(i64::MAX);
        !state.calendar.is_empty()
            && state
                .last_load_time
                .is_some_and(|loaded| now_ms.saturating_sub(loaded) < ttl_ms)
    }

    /// Returns the calendar, fetching it unless the cache is still valid.
    pub async fn load_calendar(&self, force: bool) -> Result<Vec<CalendarDay>> {
        if !force && self.is_cache_valid() {
            debug!("Serving calendar from cache");
            return Ok(self.calendar());
        }

        write(&self.state).load = LoadState::Loading;

        match self.api.calendar().await {
            Ok(calendar) => {
                {
                    let mut state = write(&self.state);
                    state.calendar = calendar.clone();
                    state.last_load_time = Some(Utc::now().timestamp_millis());
                    state.load = LoadState::Ready;
                }
                self.schedule_persist();
                Ok(calendar)
            }
            Err(e) => {
                warn!("Failed to load calendar: {e}");
                write(&self.state).load = LoadState::Failed(messages::CALENDAR_LOAD_FAILED.to_string());
                Err(e)
            }
        }
    }

    /// Rehydrates from session storage. Returns whether anything was restored.
    pub fn restore(&self) -> bool {
        let Some(snapshot) =
            storage::read_json::<HomeSnapshot>(self.storage.as_ref(), HOME_STATE_KEY)
        else {
            return false;
        };

        let mut state = write(&self.state);
        state.load = if snapshot.calendar_data.is_empty() {
            LoadState::Empty
        } else {
            LoadState::Ready
        };
        state.calendar = snapshot.calendar_data;
        state.scroll_position = snapshot.scroll_position;
        state.last_load_time = snapshot.last_load_time;
        debug!(days = state.calendar.len(), "Restored home state");
        true
    }

    /// Drops the cached calendar and its persisted snapshot.
    pub fn clear_state(&self) {
        self.persist.cancel();
        *write(&self.state) = HomeState::default();
        storage::discard(self.storage.as_ref(), HOME_STATE_KEY);
    }

    /// Writes the snapshot now instead of waiting for the debounce window.
    pub fn flush(&self) {
        self.persist.cancel();
        persist_snapshot(&self.state, self.storage.as_ref());
    }

    fn schedule_persist(&self) {
        let state = Arc::clone(&self.state);
        let storage = Arc::clone(&self.storage);
        self.persist.call(move || persist_snapshot(&state, storage.as_ref()));
    }
}

fn persist_snapshot(state: &RwLock<HomeState>, storage: &dyn SessionStorage) {
    let snapshot = read(state).snapshot();
    if let Err(e) = storage::write_json(storage, HOME_STATE_KEY, &snapshot) {
        warn!("Failed to persist home state: {e}");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use super::*;
    use crate::storage::MemoryStorage;
    use crate::stores::testing::FakeBangumi;

    fn store(api: Arc<FakeBangumi>, storage: Arc<MemoryStorage>) -> HomeStore {
        HomeStore::new(api, storage, StoreSettings::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_short_circuits_and_expires() {
        let api = Arc::new(FakeBangumi::default());
        let home = store(api.clone(), Arc::new(MemoryStorage::new()));

        assert!(!home.is_cache_valid());
        home.load_calendar(false).await.unwrap();
        home.load_calendar(false).await.unwrap();
        assert_eq!(api.calendar_calls.load(Ordering::SeqCst), 1);
        assert!(home.is_cache_valid());

        let loaded = home.last_load_time().unwrap();
        assert!(home.is_cache_valid_at(loaded + 299_999));
        assert!(!home.is_cache_valid_at(loaded + 300_000));

        home.load_calendar(true).await.unwrap();
        assert_eq!(api.calendar_calls.load(Ordering::SeqCst), 2);

        home.clear_state();
        assert!(!home.is_cache_valid());
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_is_debounced_and_restorable() {
        let storage = Arc::new(MemoryStorage::new());
        let home = store(Arc::new(FakeBangumi::default()), storage.clone());

        home.load_calendar(false).await.unwrap();
        home.set_scroll_position(120.0);
        home.set_scroll_position(480.0);
        assert!(storage.get(HOME_STATE_KEY).is_none());

        tokio::time::sleep(Duration::from_millis(350)).await;
        let raw = storage.get(HOME_STATE_KEY).unwrap();
        assert!(raw.contains("\"scrollPosition\":480.0"));
        assert!(raw.contains("\"calendarData\""));
        assert!(raw.contains("\"lastLoadTime\""));

        let fresh = store(Arc::new(FakeBangumi::default()), storage.clone());
        assert!(fresh.restore());
        assert!((fresh.scroll_position() - 480.0).abs() < f64::EPSILON);
        assert_eq!(fresh.calendar().len(), 1);
        assert_eq!(fresh.load_state(), LoadState::Ready);
        assert!(fresh.is_cache_valid());

        fresh.clear_state();
        assert!(storage.get(HOME_STATE_KEY).is_none());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_fails_open() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(HOME_STATE_KEY, "[broken".to_string()).unwrap();
        let home = store(Arc::new(FakeBangumi::default()), storage);

        assert!(!home.restore());
        assert!(home.calendar().is_empty());
    }

    #[tokio::test]
    async fn test_failed_load_is_reported() {
        let api = Arc::new(FakeBangumi {
            calendar_fails: true,
            ..FakeBangumi::default()
        });
        let home = store(api, Arc::new(MemoryStorage::new()));

        assert!(home.load_calendar(false).await.is_err());
        assert_eq!(
            home.load_state(),
            LoadState::Failed(messages::CALENDAR_LOAD_FAILED.to_string())
        );
        assert!(!home.is_cache_valid());
    }
}
