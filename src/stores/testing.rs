//! In-memory service fakes for store tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{ApiError, Result};
use crate::live::{ChannelConnector, ChannelFeed, TaskChannel};
use crate::models::{
    Availability, CalendarDay, CalendarItem, Episode, EpisodePage, JobCreate, JobUpdate,
    LibrarySearch, ResourceFilter, ResourceListing, ScheduledJob, SearchPagination, Subject,
    SubjectId, Task, TaskCreate, TaskId, TaskProgress, TaskStatus,
};
use crate::services::{BangumiApi, CrawlerApi, EpisodeQuery, ResourceApi, SchedulerApi};

pub fn not_found(silent: bool) -> ApiError {
    ApiError::from_status(404, None, silent)
}

pub fn server_error() -> ApiError {
    ApiError::from_status(500, None, false)
}

pub fn subject(id: SubjectId) -> Subject {
    Subject {
        id,
        name: format!("Subject {id}"),
        ..Subject::default()
    }
}

#[derive(Default)]
pub struct FakeBangumi {
    pub calendar_calls: AtomicUsize,
    pub subject_calls: AtomicUsize,
    pub episode_calls: AtomicUsize,
    pub calendar_fails: bool,
    pub missing: HashSet<SubjectId>,
    pub episodes: Vec<Episode>,
    pub episodes_fail: bool,
    pub episodes_delay: Option<Duration>,
    /// Episode requests that ran to completion.
    pub episodes_settled: AtomicUsize,
    pub last_episode_query: Mutex<Option<EpisodeQuery>>,
}

#[async_trait::async_trait]
impl BangumiApi for FakeBangumi {
    async fn calendar(&self) -> Result<Vec<CalendarDay>> {
        self.calendar_calls.fetch_add(1, Ordering::SeqCst);
        if self.calendar_fails {
            return Err(ApiError::Connectivity("offline".to_string()));
        }
        Ok(vec![CalendarDay {
            items: vec![CalendarItem {
                id: 1,
                ..CalendarItem::default()
            }],
            ..CalendarDay::default()
        }])
    }

    async fn subject(&self, id: SubjectId) -> Result<Subject> {
        self.subject_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.missing.contains(&id) {
            return Err(not_found(false));
        }
        Ok(subject(id))
    }

    async fn episodes(&self, _id: SubjectId, query: EpisodeQuery) -> Result<EpisodePage> {
        self.episode_calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_episode_query
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(query);
        if let Some(delay) = self.episodes_delay {
            tokio::time::sleep(delay).await;
        }
        self.episodes_settled.fetch_add(1, Ordering::SeqCst);
        if self.episodes_fail {
            return Err(server_error());
        }
        Ok(EpisodePage {
            total: u32::try_from(self.episodes.len()).unwrap_or(u32::MAX),
            data: self.episodes.clone(),
            ..EpisodePage::default()
        })
    }
}

#[derive(Default)]
pub struct FakeResources {
    pub listing_calls: AtomicUsize,
    pub availability_calls: AtomicUsize,
    /// `None` answers 404, `Some(err)` any other failure.
    pub availability: Mutex<Option<Result<Availability>>>,
    pub listings_fail: bool,
    pub search_ids: Vec<SubjectId>,
    pub total_pages: u32,
    pub search_fails: bool,
    pub last_search: Mutex<Option<(String, u32)>>,
}

#[async_trait::async_trait]
impl ResourceApi for FakeResources {
    async fn anime_resources(
        &self,
        id: SubjectId,
        filter: &ResourceFilter,
    ) -> Result<ResourceListing> {
        let calls = self.listing_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.listings_fail {
            return Err(server_error());
        }
        Ok(ResourceListing {
            bangumi_id: id,
            total_resources: u32::try_from(calls).unwrap_or(u32::MAX),
            pagination: crate::models::resource::ResourcePagination {
                limit: filter.limit(),
                offset: filter.offset(),
                total: 0,
            },
            ..ResourceListing::default()
        })
    }

    async fn episode_resources(&self, id: SubjectId, episode: u32) -> Result<ResourceListing> {
        Ok(ResourceListing {
            bangumi_id: id,
            episode: Some(episode),
            ..ResourceListing::default()
        })
    }

    async fn availability(&self, _id: SubjectId) -> Result<Availability> {
        self.availability_calls.fetch_add(1, Ordering::SeqCst);
        let mut slot = self.availability.lock().unwrap_or_else(|e| e.into_inner());
        match slot.take() {
            Some(Ok(availability)) => {
                *slot = Some(Ok(availability.clone()));
                Ok(availability)
            }
            Some(Err(e)) => Err(e),
            None => Err(not_found(true)),
        }
    }

    async fn search_library(
        &self,
        query: &str,
        page: u32,
        limit: Option<u32>,
    ) -> Result<LibrarySearch> {
        *self.last_search.lock().unwrap_or_else(|e| e.into_inner()) =
            Some((query.to_string(), page));
        if self.search_fails {
            return Err(ApiError::Connectivity("offline".to_string()));
        }
        Ok(LibrarySearch {
            bangumi_ids: self.search_ids.clone(),
            pagination: SearchPagination {
                current_page: page,
                per_page: limit.unwrap_or(12),
                total: u32::try_from(self.search_ids.len()).unwrap_or(u32::MAX),
                total_pages: self.total_pages,
                has_next: page < self.total_pages,
                has_prev: page > 1,
            },
        })
    }
}

#[derive(Default)]
pub struct FakeCrawler {
    pub tasks: Mutex<Vec<Task>>,
    pub list_calls: AtomicUsize,
    pub next_id: AtomicUsize,
}

impl FakeCrawler {
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            next_id: AtomicUsize::new(tasks.len() + 1),
            tasks: Mutex::new(tasks),
            ..Self::default()
        }
    }

    fn tasks(&self) -> std::sync::MutexGuard<'_, Vec<Task>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait::async_trait]
impl CrawlerApi for FakeCrawler {
    async fn create_task(&self, request: &TaskCreate) -> Result<Task> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as TaskId;
        let task = Task {
            id,
            task_type: "manual".to_string(),
            status: TaskStatus::Pending,
            parameters: serde_json::to_string(request).ok(),
            ..Task::default()
        };
        self.tasks().push(task.clone());
        Ok(task)
    }

    async fn list_tasks(&self, _page: u32, _page_size: u32) -> Result<Vec<Task>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.tasks().clone())
    }

    async fn get_task(&self, id: TaskId) -> Result<Task> {
        self.tasks()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| not_found(false))
    }

    async fn cancel_task(&self, id: TaskId) -> Result<Task> {
        let mut tasks = self.tasks();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found(false))?;
        task.status = TaskStatus::Cancelled;
        Ok(task.clone())
    }

    async fn task_progress(&self, id: TaskId) -> Result<TaskProgress> {
        Ok(TaskProgress {
            task_id: id,
            ..TaskProgress::default()
        })
    }
}

#[derive(Default)]
pub struct FakeScheduler {
    pub jobs: Mutex<Vec<ScheduledJob>>,
    pub list_calls: AtomicUsize,
}

impl FakeScheduler {
    fn jobs(&self) -> std::sync::MutexGuard<'_, Vec<ScheduledJob>> {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn find(&self, job_id: &str) -> Result<ScheduledJob> {
        self.jobs()
            .iter()
            .find(|j| j.job_id == job_id)
            .cloned()
            .ok_or_else(|| not_found(false))
    }
}

#[async_trait::async_trait]
impl SchedulerApi for FakeScheduler {
    async fn list_jobs(&self) -> Result<Vec<ScheduledJob>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.jobs().clone())
    }

    async fn create_job(&self, request: &JobCreate) -> Result<ScheduledJob> {
        let job = ScheduledJob {
            job_id: request.job_id.clone(),
            name: request.name.clone(),
            cron_expression: request.cron_expression.clone(),
            parameters: request.parameters.clone(),
            enabled: request.enabled.unwrap_or(true),
            description: request.description.clone(),
            ..ScheduledJob::default()
        };
        self.jobs().push(job.clone());
        Ok(job)
    }

    async fn update_job(&self, job_id: &str, update: &JobUpdate) -> Result<ScheduledJob> {
        let patch = serde_json::to_value(update)?
            .as_object()
            .cloned()
            .unwrap_or_default();
        let updated = self.find(job_id)?.merged(&patch);
        self.jobs().retain(|j| j.job_id != job_id);
        self.jobs().push(updated.clone());
        Ok(updated)
    }

    async fn delete_job(&self, job_id: &str) -> Result<ScheduledJob> {
        let job = self.find(job_id)?;
        self.jobs().retain(|j| j.job_id != job_id);
        Ok(job)
    }

    async fn toggle_job(&self, job_id: &str) -> Result<ScheduledJob> {
        let mut jobs = self.jobs();
        let job = jobs
            .iter_mut()
            .find(|j| j.job_id == job_id)
            .ok_or_else(|| not_found(false))?;
        job.enabled = !job.enabled;
        Ok(job.clone())
    }
}

/// Hands out piped channels and keeps the producer halves for the test.
#[derive(Default)]
pub struct FakeConnector {
    pub feeds: Mutex<HashMap<TaskId, ChannelFeed>>,
    pub refuse: bool,
}

impl FakeConnector {
    pub fn take_feed(&self, task_id: TaskId) -> Option<ChannelFeed> {
        self.feeds
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&task_id)
    }
}

#[async_trait::async_trait]
impl ChannelConnector for FakeConnector {
    async fn connect(&self, task_id: TaskId) -> Result<TaskChannel> {
        if self.refuse {
            return Err(ApiError::Channel("refused".to_string()));
        }
        let (feed, channel) = TaskChannel::pipe(task_id);
        self.feeds
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(task_id, feed);
        Ok(channel)
    }
}
