//! Crawler tasks, scheduled jobs and their live progress channels.
//!
//! Mutations are followed by a full list re-fetch. The one exception is
//! cancelling a task, which swaps the returned task into the list in place.
//! Progress channels are tracked per task id and are always closed on a
//! terminal status, on channel failure, on `stop_all` and when the store is
//! dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};

use serde_json::{Map, Value};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{AsyncAction, read, write};
use crate::constants::limits;
use crate::error::Result;
use crate::live::{ChannelCloser, ChannelConnector, ChannelEvent};
use crate::models::{JobCreate, JobUpdate, ScheduledJob, Task, TaskCreate, TaskId, TaskStatus};
use crate::services::{CrawlerApi, SchedulerApi};

const EVENT_BUFFER: usize = 64;

/// Why a progress channel stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The task reached a terminal status.
    Finished(TaskStatus),
    /// Transport failure or an error payload from the server.
    Failed(String),
    /// The server closed the channel.
    Remote,
    /// Closed locally.
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    /// A pushed progress update was merged into this task.
    Updated(Task),
    ChannelClosed { task_id: TaskId, reason: CloseReason },
}

/// Loading and error state for each operation.
#[derive(Debug, Default)]
pub struct TaskActions {
    pub fetch_tasks: AsyncAction,
    pub create_task: AsyncAction,
    pub cancel_task: AsyncAction,
    pub fetch_jobs: AsyncAction,
    pub create_job: AsyncAction,
    pub update_job: AsyncAction,
    pub delete_job: AsyncAction,
    pub toggle_job: AsyncAction,
}

#[derive(Debug)]
struct TaskState {
    tasks: Vec<Task>,
    jobs: Vec<ScheduledJob>,
    page: u32,
    page_size: u32,
}

impl Default for TaskState {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            jobs: Vec::new(),
            page: 1,
            page_size: limits::DEFAULT_TASK_PAGE_SIZE,
        }
    }
}

struct ChannelHandle {
    closer: ChannelCloser,
    pump: JoinHandle<()>,
}

struct Inner {
    crawler: Arc<dyn CrawlerApi>,
    scheduler: Arc<dyn SchedulerApi>,
    connector: Arc<dyn ChannelConnector>,
    state: RwLock<TaskState>,
    channels: Mutex<HashMap<TaskId, ChannelHandle>>,
    actions: TaskActions,
    events: broadcast::Sender<TaskEvent>,
}

/// Error payloads look like `{"error": "...", "code": "..."}`.
fn error_payload(update: &Map<String, Value>) -> Option<String> {
    let message = update.get("error")?;
    let message = message.as_str().map_or_else(|| message.to_string(), str::to_string);
    Some(match update.get("code").and_then(Value::as_str) {
        Some(code) => format!("{message} ({code})"),
        None => message,
    })
}

/// Status carried by a progress update, where `final_status` wins.
fn pushed_status(update: &Map<String, Value>) -> Option<TaskStatus> {
    update
        .get("final_status")
        .or_else(|| update.get("status"))
        .and_then(Value::as_str)
        .map(|s| TaskStatus::from(s.to_string()))
}

impl Inner {
    fn channels(&self) -> MutexGuard<'_, HashMap<TaskId, ChannelHandle>> {
        self.channels.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: TaskEvent) {
        let _ = self.events.send(event);
    }

    async fn fetch_tasks(&self) -> Result<Vec<Task>> {
        let (page, page_size) = {
            let state = read(&self.state);
            (state.page, state.page_size)
        };
        let tasks = self
            .actions
            .fetch_tasks
            .run(self.crawler.list_tasks(page, page_size))
            .await?;
        write(&self.state).tasks = tasks.clone();
        Ok(tasks)
    }

    /// Merges a pushed update and returns the status it carried, if any.
    fn apply_progress(&self, task_id: TaskId, update: &Map<String, Value>) -> Option<TaskStatus> {
        let status = pushed_status(update);
        let mut update = update.clone();
        if let Some(status) = &status {
            update.insert("status".to_string(), Value::String(status.to_string()));
        }

        let updated = {
            let mut state = write(&self.state);
            state.tasks.iter_mut().find(|t| t.id == task_id).map(|task| {
                *task = task.merged(&update);
                task.clone()
            })
        };
        if let Some(task) = updated {
            self.emit(TaskEvent::Updated(task));
        }
        status
    }

    /// Removes and closes the channel for `task_id` without aborting its pump.
    fn release(&self, task_id: TaskId, reason: CloseReason) {
        let handle = self.channels().remove(&task_id);
        if let Some(handle) = handle {
            handle.closer.close();
            debug!(task_id, ?reason, "Progress channel released");
            self.emit(TaskEvent::ChannelClosed { task_id, reason });
        }
    }

    fn stop(&self, task_id: TaskId) -> bool {
        let handle = self.channels().remove(&task_id);
        match handle {
            Some(handle) => {
                handle.closer.close();
                handle.pump.abort();
                self.emit(TaskEvent::ChannelClosed {
                    task_id,
                    reason: CloseReason::Stopped,
                });
                true
            }
            None => false,
        }
    }

    fn stop_all(&self) {
        let handles: Vec<(TaskId, ChannelHandle)> = self.channels().drain().collect();
        for (task_id, handle) in handles {
            handle.closer.close();
            handle.pump.abort();
            self.emit(TaskEvent::ChannelClosed {
                task_id,
                reason: CloseReason::Stopped,
            });
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let channels = self.channels.get_mut().unwrap_or_else(|e| e.into_inner());
        for (_, handle) in channels.drain() {
            handle.closer.close();
            handle.pump.abort();
        }
    }
}

async fn pump(inner: Weak<Inner>, task_id: TaskId, mut events: mpsc::Receiver<ChannelEvent>) {
    while let Some(event) = events.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };

        match event {
            ChannelEvent::Message(update) => {
                if let Some(message) = error_payload(&update) {
                    fail(&inner, task_id, message).await;
                    break;
                }
                if let Some(status) = inner.apply_progress(task_id, &update)
                    && status.is_terminal()
                {
                    info!(task_id, status = %status, "Task finished");
                    inner.release(task_id, CloseReason::Finished(status));
                    break;
                }
            }
            ChannelEvent::Error(message) => {
                fail(&inner, task_id, message).await;
                break;
            }
            ChannelEvent::Closed => {
                inner.release(task_id, CloseReason::Remote);
                break;
            }
        }
    }
}

async fn fail(inner: &Inner, task_id: TaskId, message: String) {
    warn!(task_id, "Progress channel failed: {message}");
    inner.release(task_id, CloseReason::Failed(message));
    if let Err(e) = inner.fetch_tasks().await {
        warn!("Fallback task refresh failed: {e}");
    }
}

pub struct TaskStore {
    inner: Arc<Inner>,
}

impl TaskStore {
    #[must_use]
    pub fn new(
        crawler: Arc<dyn CrawlerApi>,
        scheduler: Arc<dyn SchedulerApi>,
        connector: Arc<dyn ChannelConnector>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            inner: Arc::new(Inner {
                crawler,
                scheduler,
                connector,
                state: RwLock::new(TaskState::default()),
                channels: Mutex::new(HashMap::new()),
                actions: TaskActions::default(),
                events,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.inner.events.subscribe()
    }

    #[must_use]
    pub fn actions(&self) -> &TaskActions {
        &self.inner.actions
    }

    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        read(&self.inner.state).tasks.clone()
    }

    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<Task> {
        read(&self.inner.state)
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    #[must_use]
    pub fn jobs(&self) -> Vec<ScheduledJob> {
        read(&self.inner.state).jobs.clone()
    }

    #[must_use]
    pub fn page(&self) -> (u32, u32) {
        let state = read(&self.inner.state);
        (state.page, state.page_size)
    }

    pub fn set_page(&self, page: u32, page_size: u32) {
        let mut state = write(&self.inner.state);
        state.page = page.max(1);
        state.page_size = page_size.max(1);
    }

    pub async fn fetch_tasks(&self) -> Result<Vec<Task>> {
        self.inner.fetch_tasks().await
    }

    /// Loads one task into the list, replacing a stale copy or appending it.
    pub async fn fetch_task(&self, id: TaskId) -> Result<Task> {
        let task = self.inner.crawler.get_task(id).await?;
        let mut state = write(&self.inner.state);
        match state.tasks.iter_mut().find(|t| t.id == id) {
            Some(slot) => *slot = task.clone(),
            None => state.tasks.push(task.clone()),
        }
        Ok(task)
    }

    pub async fn create_task(&self, request: &TaskCreate) -> Result<Task> {
        let task = self
            .inner
            .actions
            .create_task
            .run(self.inner.crawler.create_task(request))
            .await?;
        info!(task_id = task.id, mode = %request.mode, "Task created");
        self.fetch_tasks().await?;
        Ok(task)
    }

    pub async fn cancel_task(&self, id: TaskId) -> Result<Task> {
        let task = self
            .inner
            .actions
            .cancel_task
            .run(self.inner.crawler.cancel_task(id))
            .await?;
        if let Some(slot) = write(&self.inner.state)
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
        {
            *slot = task.clone();
        }
        Ok(task)
    }

    pub async fn fetch_jobs(&self) -> Result<Vec<ScheduledJob>> {
        let jobs = self
            .inner
            .actions
            .fetch_jobs
            .run(self.inner.scheduler.list_jobs())
            .await?;
        write(&self.inner.state).jobs = jobs.clone();
        Ok(jobs)
    }

    pub async fn create_job(&self, request: &JobCreate) -> Result<ScheduledJob> {
        let job = self
            .inner
            .actions
            .create_job
            .run(self.inner.scheduler.create_job(request))
            .await?;
        self.fetch_jobs().await?;
        Ok(job)
    }

    pub async fn update_job(&self, job_id: &str, update: &JobUpdate) -> Result<ScheduledJob> {
        let job = self
            .inner
            .actions
            .update_job
            .run(self.inner.scheduler.update_job(job_id, update))
            .await?;
        self.fetch_jobs().await?;
        Ok(job)
    }

    pub async fn delete_job(&self, job_id: &str) -> Result<ScheduledJob> {
        let job = self
            .inner
            .actions
            .delete_job
            .run(self.inner.scheduler.delete_job(job_id))
            .await?;
        self.fetch_jobs().await?;
        Ok(job)
    }

    pub async fn toggle_job(&self, job_id: &str) -> Result<ScheduledJob> {
        let job = self
            .inner
            .actions
            .toggle_job
            .run(self.inner.scheduler.toggle_job(job_id))
            .await?;
        self.fetch_jobs().await?;
        Ok(job)
    }

    /// Starts following live progress for `task_id`.
    ///
    /// Returns `false` when a channel for the task is already open.
    pub async fn start_progress(&self, task_id: TaskId) -> Result<bool> {
        if self.is_tracking(task_id) {
            return Ok(false);
        }

        let channel = self.inner.connector.connect(task_id).await?;
        let (events, closer) = channel.into_parts();

        let mut channels = self.inner.channels();
        if channels.contains_key(&task_id) {
            closer.close();
            return Ok(false);
        }
        let pump = tokio::spawn(pump(Arc::downgrade(&self.inner), task_id, events));
        channels.insert(task_id, ChannelHandle { closer, pump });
        debug!(task_id, "Following task progress");
        Ok(true)
    }

    /// Closes the channel for `task_id`. Returns whether one was open.
    pub fn stop_progress(&self, task_id: TaskId) -> bool {
        self.inner.stop(task_id)
    }

    pub fn stop_all(&self) {
        self.inner.stop_all();
    }

    #[must_use]
    pub fn is_tracking(&self, task_id: TaskId) -> bool {
        self.inner.channels().contains_key(&task_id)
    }

    #[must_use]
    pub fn tracked(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self.inner.channels().keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
