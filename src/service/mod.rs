// src/service/mod.rs
// Remote job service - the server that stores jobs and removes watermarks

mod http;
mod types;
mod upload;

pub use http::HttpJobService;
pub use types::{DownloadLink, JobId, JobStatus, ServiceError, UploadResponse, VideoJob};
pub use upload::{UploadError, VideoUpload, ACCEPTED_EXTENSIONS, MAX_UPLOAD_BYTES};

use crate::identity::{Access, Rendition};
use crate::selection::SelectionSet;
use async_trait::async_trait;

/// Contract shared by the authenticated and anonymous endpoint families.
///
/// Every call takes the `Access` its operation resolved; implementations must
/// not look identity up on their own.
#[async_trait]
pub trait JobService: Send + Sync {
    async fn upload(&self, access: &Access, video: &VideoUpload) -> Result<UploadResponse, ServiceError>;

    async fn job_status(&self, access: &Access, job_id: &JobId) -> Result<VideoJob, ServiceError>;

    async fn submit_selections(
        &self,
        access: &Access,
        job_id: &JobId,
        selections: &SelectionSet,
    ) -> Result<(), ServiceError>;

    async fn selections(&self, access: &Access, job_id: &JobId) -> Result<SelectionSet, ServiceError>;

    async fn start_processing(&self, access: &Access, job_id: &JobId) -> Result<(), ServiceError>;

    async fn list_jobs(&self, access: &Access) -> Result<Vec<VideoJob>, ServiceError>;

    async fn delete_job(&self, access: &Access, job_id: &JobId) -> Result<(), ServiceError>;

    async fn download_link(&self, access: &Access, job_id: &JobId) -> Result<DownloadLink, ServiceError>;

    /// Absolute URL the player loads for the given rendition
    fn stream_url(&self, access: &Access, job_id: &JobId, rendition: Rendition) -> String;
}
