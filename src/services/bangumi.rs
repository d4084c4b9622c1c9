//! Bangumi metadata: airing calendar, subjects and episode lists.

use futures::future::join_all;
use tracing::warn;

use crate::constants::limits;
use crate::error::Result;
use crate::http::HttpClient;
use crate::models::{CalendarDay, EpisodePage, EpisodeType, Subject, SubjectId};

/// Episode list request options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EpisodeQuery {
    pub kind: Option<EpisodeType>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl EpisodeQuery {
    #[must_use]
    pub fn main(limit: u32) -> Self {
        Self {
            kind: Some(EpisodeType::Main),
            limit: Some(limit),
            offset: None,
        }
    }
}

/// Read access to Bangumi subject data.
///
/// # Examples
///
/// ```rust,ignore
/// async fn names(api: &dyn BangumiApi, ids: &[u32]) -> Vec<String> {
///     api.batch_subjects(ids)
///         .await
///         .into_iter()
///         .map(|s| s.display_name().to_string())
///         .collect()
/// }
/// ```
#[async_trait::async_trait]
pub trait BangumiApi: Send + Sync {
    /// Weekly airing calendar.
    async fn calendar(&self) -> Result<Vec<CalendarDay>>;

    async fn subject(&self, id: SubjectId) -> Result<Subject>;

    /// Episodes of `id`. Unset limit and offset default to 100 and 0.
    async fn episodes(&self, id: SubjectId, query: EpisodeQuery) -> Result<EpisodePage>;

    /// Fetches all `ids` concurrently, dropping the ones that fail.
    ///
    /// Results keep the relative order of `ids`. Never fails as a whole.
    async fn batch_subjects(&self, ids: &[SubjectId]) -> Vec<Subject> {
        let results = join_all(ids.iter().map(|&id| self.subject(id))).await;

        ids.iter()
            .zip(results)
            .filter_map(|(id, result)| match result {
                Ok(subject) => Some(subject),
                Err(e) => {
                    warn!(subject_id = id, "Dropping subject from batch: {e}");
                    None
                }
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct HttpBangumiApi {
    http: HttpClient,
}

impl HttpBangumiApi {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait::async_trait]
impl BangumiApi for HttpBangumiApi {
    async fn calendar(&self) -> Result<Vec<CalendarDay>> {
        self.http.get("/bangumi/calendar", &[]).await
    }

    async fn subject(&self, id: SubjectId) -> Result<Subject> {
        self.http.get(&format!("/bangumi/subjects/{id}"), &[]).await
    }

    async fn episodes(&self, id: SubjectId, query: EpisodeQuery) -> Result<EpisodePage> {
        let mut params = Vec::with_capacity(3);
        if let Some(kind) = query.kind {
            params.push(("type", u8::from(kind).to_string()));
        }
        params.push((
            "limit",
            query
                .limit
                .unwrap_or(limits::DEFAULT_EPISODE_LIMIT)
                .to_string(),
        ));
        params.push(("offset", query.offset.unwrap_or(0).to_string()));

        self.http
            .get(&format!("/bangumi/subjects/{id}/episodes"), &params)
            .await
    }
}
