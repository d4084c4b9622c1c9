//! Detects "back from a detail page" so list views know whether to restore
//! their previous state or start fresh.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::storage::NAVIGATION_KEY;
use crate::storage::{self, SessionStorage};

const DETAIL_MARKERS: [&str; 2] = ["/anime/", "/library/detail/"];

/// Where the user currently is, and where they came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub pathname: String,
    /// Referring page, as a path or a full URL.
    pub referrer: Option<String>,
}

impl Location {
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            referrer: None,
        }
    }

    #[must_use]
    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    fn referrer_path(&self) -> Option<String> {
        let referrer = self.referrer.as_deref()?;
        match url::Url::parse(referrer) {
            Ok(url) => Some(url.path().to_string()),
            Err(_) => Some(referrer.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NavigationRecord {
    last_detail_path: String,
    timestamp: i64,
    #[serde(default)]
    from_path: String,
}

#[must_use]
pub fn is_detail_path(path: &str) -> bool {
    DETAIL_MARKERS.iter().any(|marker| path.contains(marker))
}

fn matches_target(path: &str, target: &str) -> bool {
    path == target || path.starts_with(target)
}

#[derive(Clone)]
pub struct NavigationStore {
    storage: Arc<dyn SessionStorage>,
}

impl NavigationStore {
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    /// Remembers that a detail page was opened from `from_path`.
    ///
    /// Without `from_path` the referrer of `location` is used.
    pub fn record_detail_visit(&self, detail_path: &str, from_path: Option<&str>, location: &Location) {
        let from_path = from_path
            .map(str::to_string)
            .or_else(|| location.referrer_path())
            .unwrap_or_default();

        let record = NavigationRecord {
            last_detail_path: detail_path.to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            from_path,
        };
        debug!(detail = %record.last_detail_path, from = %record.from_path, "Recorded detail visit");

        if let Err(e) = storage::write_json(self.storage.as_ref(), NAVIGATION_KEY, &record) {
            warn!("Failed to record navigation state: {e}");
        }
    }

    /// Whether arriving at `location` counts as returning to `target` from a
    /// detail page. A positive answer consumes the stored record.
    pub fn is_returning_from_detail(&self, target: &str, location: &Location) -> bool {
        let is_target = matches_target(&location.pathname, target);
        let by_referrer = location.referrer.as_deref().is_some_and(is_detail_path);
        let by_record = storage::read_json::<NavigationRecord>(self.storage.as_ref(), NAVIGATION_KEY)
            .is_some_and(|record| {
                is_detail_path(&record.last_detail_path) && matches_target(&record.from_path, target)
            });

        let returning = is_target && (by_referrer || by_record);
        debug!(target, is_target, by_referrer, by_record, returning, "Checked return from detail");

        if returning {
            storage::discard(self.storage.as_ref(), NAVIGATION_KEY);
        }
        returning
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn store() -> (Arc<MemoryStorage>, NavigationStore) {
        let storage = Arc::new(MemoryStorage::new());
        (storage.clone(), NavigationStore::new(storage))
    }

    #[test]
    fn test_record_makes_return_detectable_once() {
        let (_, nav) = store();
        nav.record_detail_visit("/anime/42", Some("/library"), &Location::new("/library"));

        let back = Location::new("/library");
        assert!(nav.is_returning_from_detail("/library", &back));
        assert!(!nav.is_returning_from_detail("/library", &back));
    }

    #[test]
    fn test_wrong_target_does_not_consume_record() {
        let (storage, nav) = store();
        nav.record_detail_visit("/library/detail/42", Some("/library"), &Location::new("/x"));

        assert!(!nav.is_returning_from_detail("/library", &Location::new("/schedule")));
        assert!(storage.get(NAVIGATION_KEY).is_some());
    }

    #[test]
    fn test_referrer_alone_is_enough() {
        let (_, nav) = store();
        let location = Location::new("/library/search").with_referrer("http://localhost:5173/anime/9");
        assert!(nav.is_returning_from_detail("/library", &location));
    }

    #[test]
    fn test_record_from_other_page_is_ignored() {
        let (_, nav) = store();
        nav.record_detail_visit("/anime/1", Some("/"), &Location::new("/"));
        assert!(!nav.is_returning_from_detail("/library", &Location::new("/library")));

        nav.record_detail_visit("/settings", Some("/library"), &Location::new("/"));
        assert!(!nav.is_returning_from_detail("/library", &Location::new("/library")));
    }

    #[test]
    fn test_from_path_falls_back_to_referrer() {
        let (_, nav) = store();
        let location = Location::new("/anime/3").with_referrer("http://localhost:5173/library?q=x");
        nav.record_detail_visit("/anime/3", None, &location);

        assert!(nav.is_returning_from_detail("/library", &Location::new("/library")));
    }

    #[test]
    fn test_corrupt_record_is_absent() {
        let (storage, nav) = store();
        storage.set(NAVIGATION_KEY, "{oops".to_string()).unwrap();
        assert!(!nav.is_returning_from_detail("/library", &Location::new("/library")));
    }
}
