use crate::identity::{resolve, IdentityProvider};
use crate::service::{DownloadLink, JobId, JobService, JobStatus, ServiceError, VideoJob};
use crate::timestamps::format_local;
use serde::Serialize;
use std::sync::Arc;

/// One row of the job list, ready for display
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCard {
    pub id: JobId,
    pub file_name: String,
    pub status: JobStatus,
    pub status_label: &'static str,
    pub uploaded: String,
    pub started: Option<String>,
    pub completed: Option<String>,
    pub error_message: Option<String>,
    pub can_download: bool,
}

impl From<&VideoJob> for JobCard {
    fn from(job: &VideoJob) -> Self {
        let local = |value: &Option<String>| value.as_deref().map(format_local).filter(|s| !s.is_empty());
        Self {
            id: job.id.clone(),
            file_name: job.original_filename.clone(),
            status: job.status,
            status_label: job.status.label(),
            uploaded: local(&job.created_at).unwrap_or_default(),
            started: local(&job.processing_started_at),
            completed: local(&job.processing_completed_at),
            error_message: job.error_message.clone(),
            can_download: job.status == JobStatus::Completed,
        }
    }
}

/// Account-scoped job management; every operation requires a signed-in identity
#[derive(Clone)]
pub struct Dashboard {
    service: Arc<dyn JobService>,
    identity: Arc<dyn IdentityProvider>,
}

impl Dashboard {
    pub fn new(service: Arc<dyn JobService>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { service, identity }
    }

    pub async fn jobs(&self) -> Result<Vec<JobCard>, ServiceError> {
        let access = resolve(&self.identity.current());
        let jobs = self.service.list_jobs(&access).await.map_err(|e| self.on_error(e))?;
        tracing::debug!("Loaded {} jobs", jobs.len());
        Ok(jobs.iter().map(JobCard::from).collect())
    }

    pub async fn delete(&self, job_id: &JobId) -> Result<(), ServiceError> {
        let access = resolve(&self.identity.current());
        self.service
            .delete_job(&access, job_id)
            .await
            .map_err(|e| self.on_error(e))?;
        tracing::info!("Deleted job {}", job_id);
        Ok(())
    }

    pub async fn download_link(&self, job_id: &JobId) -> Result<DownloadLink, ServiceError> {
        let access = resolve(&self.identity.current());
        self.service
            .download_link(&access, job_id)
            .await
            .map_err(|e| self.on_error(e))
    }

    fn on_error(&self, err: ServiceError) -> ServiceError {
        if matches!(err, ServiceError::Unauthorized) {
            self.identity.revoke();
        }
        tracing::warn!("Dashboard request failed: {}", err);
        err
    }
}
