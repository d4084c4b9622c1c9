//! Everything the anime detail view shows for one subject.

use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use super::{LoadState, read, write};
use crate::constants::{limits, messages};
use crate::error::Result;
use crate::models::{Availability, Episode, EpisodeType, Subject, SubjectId};
use crate::services::{BangumiApi, EpisodeQuery, ResourceApi};

#[derive(Debug, Default)]
struct DetailState {
    bangumi_id: Option<SubjectId>,
    subject: Option<Subject>,
    episodes: Vec<Episode>,
    availability: Option<Availability>,
    load: LoadState,
}

pub struct AnimeDetailStore {
    bangumi: Arc<dyn BangumiApi>,
    resources: Arc<dyn ResourceApi>,
    state: RwLock<DetailState>,
}

impl AnimeDetailStore {
    #[must_use]
    pub fn new(bangumi: Arc<dyn BangumiApi>, resources: Arc<dyn ResourceApi>) -> Self {
        Self {
            bangumi,
            resources,
            state: RwLock::new(DetailState::default()),
        }
    }

    #[must_use]
    pub fn bangumi_id(&self) -> Option<SubjectId> {
        read(&self.state).bangumi_id
    }

    #[must_use]
    pub fn subject(&self) -> Option<Subject> {
        read(&self.state).subject.clone()
    }

    #[must_use]
    pub fn episodes(&self) -> Vec<Episode> {
        read(&self.state).episodes.clone()
    }

    #[must_use]
    pub fn availability(&self) -> Option<Availability> {
        read(&self.state).availability.clone()
    }

    #[must_use]
    pub fn load_state(&self) -> LoadState {
        read(&self.state).load.clone()
    }

    #[must_use]
    pub fn main_episodes(&self) -> Vec<Episode> {
        read(&self.state)
            .episodes
            .iter()
            .filter(|ep| ep.kind == EpisodeType::Main)
            .cloned()
            .collect()
    }

    /// Whether any episode has at least one release.
    #[must_use]
    pub fn has_resource(&self) -> bool {
        read(&self.state)
            .availability
            .as_ref()
            .is_some_and(Availability::has_resource)
    }

    /// Loads subject, episodes and availability for `id`.
    ///
    /// Subject and episodes are fetched together and either failure fails the
    /// load, with the subject error taking precedence. Availability follows
    /// and only ever degrades to "none". Calling again for an already loaded
    /// id does nothing.
    pub async fn fetch_all(&self, id: SubjectId) -> Result<()> {
        {
            let state = read(&self.state);
            if state.bangumi_id == Some(id)
                && state.subject.is_some()
                && state.load == LoadState::Ready
            {
                debug!(bangumi_id = id, "Detail already loaded");
                return Ok(());
            }
        }

        *write(&self.state) = DetailState {
            bangumi_id: Some(id),
            load: LoadState::Loading,
            ..DetailState::default()
        };

        // Both requests settle before either failure is reported.
        let (subject, episodes) = futures::join!(
            self.bangumi.subject(id),
            self.bangumi
                .episodes(id, EpisodeQuery::main(limits::DETAIL_EPISODE_LIMIT)),
        );
        let (subject, episodes) = match (subject, episodes) {
            (Ok(subject), Ok(episodes)) => (subject, episodes),
            (Err(e), _) | (Ok(_), Err(e)) => {
                warn!(bangumi_id = id, "Failed to load anime detail: {e}");
                let mut state = write(&self.state);
                if state.bangumi_id == Some(id) {
                    state.load = LoadState::Failed(messages::DETAIL_LOAD_FAILED.to_string());
                }
                return Err(e);
            }
        };

        {
            let mut state = write(&self.state);
            if state.bangumi_id != Some(id) {
                return Ok(());
            }
            state.subject = Some(subject);
            state.episodes = episodes.data;
        }

        let availability = self.load_availability(id).await;

        let mut state = write(&self.state);
        if state.bangumi_id == Some(id) {
            state.availability = availability;
            state.load = LoadState::Ready;
        }
        Ok(())
    }

    pub async fn fetch_subject(&self, id: SubjectId) -> Result<()> {
        match self.bangumi.subject(id).await {
            Ok(subject) => {
                write(&self.state).subject = Some(subject);
                Ok(())
            }
            Err(e) => {
                write(&self.state).load = LoadState::Failed(messages::DETAIL_LOAD_FAILED.to_string());
                Err(e)
            }
        }
    }

    pub async fn fetch_episodes(&self, id: SubjectId) -> Result<()> {
        let query = EpisodeQuery::main(limits::DETAIL_EPISODE_LIMIT);
        match self.bangumi.episodes(id, query).await {
            Ok(page) => {
                write(&self.state).episodes = page.data;
                Ok(())
            }
            Err(e) => {
                write(&self.state).load = LoadState::Failed(messages::DETAIL_LOAD_FAILED.to_string());
                Err(e)
            }
        }
    }

    /// Refreshes availability alone. Unlike [`Self::fetch_all`], failures
    /// other than not-found are returned to the caller.
    pub async fn fetch_availability(&self, id: SubjectId) -> Result<()> {
        match self.resources.availability(id).await {
            Ok(availability) => {
                write(&self.state).availability = Some(availability);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                write(&self.state).availability = None;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn clear(&self) {
        *write(&self.state) = DetailState::default();
    }

    async fn load_availability(&self, id: SubjectId) -> Option<Availability> {
        match self.resources.availability(id).await {
            Ok(availability) => Some(availability),
            Err(e) if e.is_not_found() => {
                debug!(bangumi_id = id, "No availability data yet");
                None
            }
            Err(e) => {
                warn!(
                    bangumi_id = id,
                    "{}: {e}",
                    messages::AVAILABILITY_LOAD_FAILED
                );
                None
            }
        }
    }
}
