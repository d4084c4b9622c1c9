//! Cron-scheduled crawl jobs.
//!
//! The backend mounts this router under a doubled `/api/v1` prefix, so paths
//! here carry it again on top of the configured base URL.

use crate::error::Result;
use crate::http::HttpClient;
use crate::models::{JobCreate, JobUpdate, ScheduledJob};

const JOBS_PATH: &str = "/api/v1/scheduler/jobs";

#[async_trait::async_trait]
pub trait SchedulerApi: Send + Sync {
    async fn list_jobs(&self) -> Result<Vec<ScheduledJob>>;

    async fn create_job(&self, request: &JobCreate) -> Result<ScheduledJob>;

    async fn update_job(&self, job_id: &str, update: &JobUpdate) -> Result<ScheduledJob>;

    /// Deletes a job and returns it as it was.
    async fn delete_job(&self, job_id: &str) -> Result<ScheduledJob>;

    /// Flips `enabled` and returns the job after the change.
    async fn toggle_job(&self, job_id: &str) -> Result<ScheduledJob>;
}

fn job_path(job_id: &str) -> String {
    format!("{JOBS_PATH}/{}", urlencoding::encode(job_id))
}

#[derive(Clone)]
pub struct HttpSchedulerApi {
    http: HttpClient,
}

impl HttpSchedulerApi {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait::async_trait]
impl SchedulerApi for HttpSchedulerApi {
    async fn list_jobs(&self) -> Result<Vec<ScheduledJob>> {
        self.http.get(JOBS_PATH, &[]).await
    }

    async fn create_job(&self, request: &JobCreate) -> Result<ScheduledJob> {
        self.http.post(JOBS_PATH, request).await
    }

    async fn update_job(&self, job_id: &str, update: &JobUpdate) -> Result<ScheduledJob> {
        self.http.put(&job_path(job_id), update).await
    }

    async fn delete_job(&self, job_id: &str) -> Result<ScheduledJob> {
        self.http.delete(&job_path(job_id)).await
    }

    async fn toggle_job(&self, job_id: &str) -> Result<ScheduledJob> {
        self.http
            .post_empty(&format!("{}/toggle", job_path(job_id)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_ids_are_percent_encoded() {
        assert_eq!(job_path("daily"), "/api/v1/scheduler/jobs/daily");
        assert_eq!(
            job_path("season crawl/2024"),
            "/api/v1/scheduler/jobs/season%20crawl%2F2024"
        );
    }
}
