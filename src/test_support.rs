//! Fakes shared by the session and editor tests

use crate::identity::{Access, CompletionOutcome, EndpointFamily, Rendition};
use crate::selection::{Overlay, SelectionSet};
use crate::service::{DownloadLink, JobId, JobService, JobStatus, ServiceError, UploadResponse, VideoJob, VideoUpload};
use crate::session::{Notice, SessionEvents, Step};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Scripted job service; statuses are handed out in order.
#[derive(Default)]
pub struct FakeService {
    pub statuses: Mutex<VecDeque<Result<JobStatus, ServiceError>>>,
    pub calls: Mutex<Vec<(&'static str, EndpointFamily)>>,
    pub saved: Mutex<SelectionSet>,
    pub fail_upload: AtomicBool,
    pub fail_submit: AtomicBool,
    pub fail_start: AtomicBool,
    gate: Option<(&'static str, Arc<Notify>)>,
}

impl FakeService {
    pub fn scripted(statuses: Vec<Result<JobStatus, ServiceError>>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            ..Self::default()
        }
    }

    /// Calls to `op` block until the gate is notified
    pub fn gated(op: &'static str, gate: Arc<Notify>, statuses: Vec<Result<JobStatus, ServiceError>>) -> Self {
        Self {
            gate: Some((op, gate)),
            ..Self::scripted(statuses)
        }
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(name, _)| *name == op).count()
    }

    pub fn families(&self, op: &str) -> Vec<EndpointFamily> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| *name == op)
            .map(|(_, family)| *family)
            .collect()
    }

    async fn enter(&self, op: &'static str, access: &Access) {
        self.calls.lock().unwrap().push((op, access.family()));
        if let Some((gated, gate)) = &self.gate {
            if *gated == op {
                gate.notified().await;
            }
        }
    }
}

pub fn job(status: JobStatus) -> VideoJob {
    VideoJob {
        id: JobId::new("1"),
        status,
        original_filename: "clip.mp4".to_string(),
        created_at: Some("2025-10-16T15:38:00".to_string()),
        processing_started_at: None,
        processing_completed_at: None,
        error_message: (status == JobStatus::Failed).then(|| "Decoder crashed".to_string()),
        user_id: None,
    }
}

#[async_trait]
impl JobService for FakeService {
    async fn upload(&self, access: &Access, _video: &VideoUpload) -> Result<UploadResponse, ServiceError> {
        self.enter("upload", access).await;
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(ServiceError::Network("connection reset".to_string()));
        }
        Ok(UploadResponse {
            job_id: JobId::new("1"),
            message: None,
        })
    }

    async fn job_status(&self, access: &Access, _job_id: &JobId) -> Result<VideoJob, ServiceError> {
        self.enter("status", access).await;
        match self.statuses.lock().unwrap().pop_front() {
            Some(Ok(status)) => Ok(job(status)),
            Some(Err(e)) => Err(e),
            None => Err(ServiceError::Network("script exhausted".to_string())),
        }
    }

    async fn submit_selections(
        &self,
        access: &Access,
        _job_id: &JobId,
        _selections: &SelectionSet,
    ) -> Result<(), ServiceError> {
        self.enter("watermarks", access).await;
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(ServiceError::Network("connection reset".to_string()));
        }
        Ok(())
    }

    async fn selections(&self, access: &Access, _job_id: &JobId) -> Result<SelectionSet, ServiceError> {
        self.enter("get_watermarks", access).await;
        Ok(self.saved.lock().unwrap().clone())
    }

    async fn start_processing(&self, access: &Access, _job_id: &JobId) -> Result<(), ServiceError> {
        self.enter("process", access).await;
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(ServiceError::Http {
                status: 502,
                detail: "bad gateway".to_string(),
            });
        }
        Ok(())
    }

    async fn list_jobs(&self, access: &Access) -> Result<Vec<VideoJob>, ServiceError> {
        access.require_authenticated()?;
        Ok(Vec::new())
    }

    async fn delete_job(&self, access: &Access, _job_id: &JobId) -> Result<(), ServiceError> {
        access.require_authenticated()?;
        Ok(())
    }

    async fn download_link(&self, access: &Access, _job_id: &JobId) -> Result<DownloadLink, ServiceError> {
        access.require_authenticated()?;
        Err(ServiceError::NotFound)
    }

    fn stream_url(&self, access: &Access, job_id: &JobId, rendition: Rendition) -> String {
        format!("http://svc{}", access.family().stream_path(job_id, rendition))
    }
}

#[derive(Default)]
pub struct Recorder {
    pub notices: Mutex<Vec<Notice>>,
    pub steps: Mutex<Vec<Step>>,
    pub progress: Mutex<Vec<u8>>,
    pub outcomes: Mutex<Vec<CompletionOutcome>>,
    pub redraws: Mutex<Vec<u64>>,
}

impl Recorder {
    pub fn last_notice(&self) -> Option<Notice> {
        self.notices.lock().unwrap().last().cloned()
    }
}

impl SessionEvents for Recorder {
    fn notice(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }

    fn step_changed(&self, _job_id: &JobId, step: Step) {
        self.steps.lock().unwrap().push(step);
    }

    fn progress(&self, _job_id: &JobId, progress: u8) {
        self.progress.lock().unwrap().push(progress);
    }

    fn completed(&self, _job_id: &JobId, outcome: &CompletionOutcome) {
        self.outcomes.lock().unwrap().push(outcome.clone());
    }

    fn redraw(&self, overlay: &Overlay) {
        self.redraws.lock().unwrap().push(overlay.revision);
    }
}

/// A small `.mp4` on disk; keep the temp file alive while the upload is used
pub fn sample_video() -> (tempfile::NamedTempFile, VideoUpload) {
    let mut file = tempfile::Builder::new().suffix(".mp4").tempfile().unwrap();
    file.write_all(b"\x00\x00\x00\x18ftypmp42").unwrap();
    let upload = VideoUpload::from_path(file.path()).unwrap();
    (file, upload)
}
