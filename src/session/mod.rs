use crate::identity::{completion_outcome, resolve, Access, IdentityProvider};
use crate::selection::SelectionSet;
use crate::service::{JobId, JobService, JobStatus, ServiceError, VideoJob, VideoUpload};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex as TokioMutex;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use uuid::Uuid;

pub mod events;
pub mod poller;
pub mod progress;
pub mod step;

pub use events::{Notice, NoticeLevel, SessionEvents};
pub use poller::PollTask;
pub use progress::{SessionProgress, SimulatedProgress};
pub use step::{Action, SessionError, Step};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Ephemeral per-job state, destroyed when the job view closes
struct ProcessingSession {
    id: Uuid,
    job_id: JobId,
    step: Step,
    busy: bool,
    progress: SimulatedProgress,
    saved: Option<SelectionSet>,
    job: Option<VideoJob>,
    poller: Option<PollTask>,
}

impl ProcessingSession {
    fn new(job_id: JobId) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            step: Step::Selecting,
            busy: false,
            progress: SimulatedProgress::default(),
            saved: None,
            job: None,
            poller: None,
        }
    }

    fn check(&self, action: Action) -> Result<(), SessionError> {
        if self.busy {
            return Err(SessionError::Busy);
        }
        if self.step != action.accepted_from() {
            return Err(SessionError::InvalidTransition {
                step: self.step,
                action,
            });
        }
        Ok(())
    }

    fn snapshot(&self) -> SessionProgress {
        SessionProgress {
            job_id: self.job_id.clone(),
            step: self.step,
            is_processing: self.step == Step::Processing,
            progress: self.progress.value(),
            selection_count: self.saved.as_ref().map(SelectionSet::len).unwrap_or(0),
            busy: self.busy,
            error_message: self.job.as_ref().and_then(|job| job.error_message.clone()),
        }
    }
}

struct Shared {
    service: Arc<dyn JobService>,
    identity: Arc<dyn IdentityProvider>,
    events: Arc<dyn SessionEvents>,
    poll_interval: Duration,
    current: TokioMutex<Option<ProcessingSession>>,
    uploading: AtomicBool,
}

/// Held for the duration of one upload; a second upload is rejected while it lives
struct UploadGuard<'a>(&'a AtomicBool);

impl<'a> UploadGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for UploadGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Shared {
    fn access(&self) -> Access {
        resolve(&self.identity.current())
    }

    fn report_failure(&self, context: &str, err: &ServiceError) {
        if matches!(err, ServiceError::Unauthorized) {
            self.identity.revoke();
        }
        tracing::error!("{}: {}", context, err);
        self.events.notice(Notice::error(format!("{}: {}", context, err)));
    }

    /// Apply one status observation; returns whether polling should continue
    async fn observe(&self, session_id: Uuid, job: VideoJob, access: &Access) -> bool {
        let mut current = self.current.lock().await;
        let Some(session) = current.as_mut().filter(|s| s.id == session_id) else {
            tracing::debug!("Dropping status for job {}: session closed", job.id);
            return false;
        };

        let status = job.status;
        session.job = Some(job);
        if status.is_terminal() {
            session.poller = None;
        }

        match status {
            JobStatus::Pending => true,
            JobStatus::Processing => {
                let value = session.progress.advance();
                self.events.progress(&session.job_id, value);
                true
            }
            JobStatus::Completed => {
                self.complete(session, access);
                false
            }
            JobStatus::Failed => {
                self.fail(session);
                false
            }
        }
    }

    fn complete(&self, session: &mut ProcessingSession, access: &Access) {
        session.step = Step::Completed;
        let value = session.progress.complete();
        self.events.progress(&session.job_id, value);
        self.events.step_changed(&session.job_id, session.step);
        self.events.notice(Notice::success("Processing completed!"));

        let outcome = completion_outcome(access, &session.job_id, self.service.as_ref());
        tracing::info!("Job {} completed ({:?} access)", session.job_id, access.family());
        self.events.completed(&session.job_id, &outcome);
    }

    fn fail(&self, session: &mut ProcessingSession) {
        session.step = Step::Failed;
        let reason = session
            .job
            .as_ref()
            .and_then(|job| job.error_message.as_deref())
            .map(str::trim)
            .filter(|msg| !msg.is_empty());

        let message = match reason {
            Some(reason) => format!("Processing failed: {}", reason),
            None => "Processing failed".to_string(),
        };
        tracing::warn!("Job {} failed: {}", session.job_id, message);
        self.events.step_changed(&session.job_id, session.step);
        self.events.notice(Notice::error(message));
    }
}

fn matching(slot: &mut Option<ProcessingSession>, session_id: Uuid) -> Result<&mut ProcessingSession, SessionError> {
    match slot.as_mut().filter(|s| s.id == session_id) {
        Some(session) => Ok(session),
        None => {
            tracing::debug!("Discarding response for a session that is no longer open");
            Err(SessionError::Stale)
        }
    }
}

async fn poll_loop(shared: Weak<Shared>, session_id: Uuid, job_id: JobId, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };

        let access = shared.access();
        let job = match shared.service.job_status(&access, &job_id).await {
            Ok(job) => job,
            Err(e) => {
                if matches!(e, ServiceError::Unauthorized) {
                    shared.identity.revoke();
                }
                if e.is_retryable() {
                    tracing::debug!("Status poll for job {} failed, retrying: {}", job_id, e);
                } else {
                    tracing::warn!("Status poll for job {} rejected, retrying: {}", job_id, e);
                }
                continue;
            }
        };

        if !shared.observe(session_id, job, &access).await {
            break;
        }
    }
}

/// Drives one job at a time through select → review → process → done.
#[derive(Clone)]
pub struct JobOrchestrator {
    shared: Arc<Shared>,
}

impl JobOrchestrator {
    pub fn new(
        service: Arc<dyn JobService>,
        identity: Arc<dyn IdentityProvider>,
        events: Arc<dyn SessionEvents>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                service,
                identity,
                events,
                poll_interval,
                current: TokioMutex::new(None),
                uploading: AtomicBool::new(false),
            }),
        }
    }

    /// Upload a validated file and open a session for the resulting job
    pub async fn upload(&self, video: &VideoUpload) -> Result<SessionProgress, SessionError> {
        let Some(_uploading) = UploadGuard::acquire(&self.shared.uploading) else {
            tracing::debug!("Ignoring upload of {}: another upload is in flight", video.file_name());
            return Err(SessionError::Busy);
        };

        let access = self.shared.access();
        let response = match self.shared.service.upload(&access, video).await {
            Ok(response) => response,
            Err(e) => {
                self.shared.report_failure("Upload failed", &e);
                return Err(e.into());
            }
        };

        tracing::info!("Uploaded {} as job {}", video.file_name(), response.job_id);
        self.shared.events.notice(Notice::success("Video uploaded successfully!"));
        self.open(response.job_id).await
    }

    /// Start a fresh session for `job_id`, closing any previous one
    pub async fn open(&self, job_id: JobId) -> Result<SessionProgress, SessionError> {
        let session_id = {
            let mut current = self.shared.current.lock().await;
            if let Some(previous) = current.take() {
                tracing::debug!("Closing session for job {}", previous.job_id);
            }
            let session = ProcessingSession::new(job_id.clone());
            let id = session.id;
            *current = Some(session);
            id
        };

        let access = self.shared.access();
        let fetched = self.shared.service.job_status(&access, &job_id).await;
        let saved = match &fetched {
            Ok(job) if job.status == JobStatus::Pending => self.saved_on_server(&access, &job_id).await,
            _ => None,
        };

        let mut current = self.shared.current.lock().await;
        let session = matching(&mut current, session_id)?;
        let job = match fetched {
            Ok(job) => job,
            Err(e) => {
                self.shared.report_failure("Failed to fetch job details", &e);
                return Err(e.into());
            }
        };

        let status = job.status;
        session.job = Some(job);
        session.saved = saved;
        match status {
            JobStatus::Pending => {}
            JobStatus::Processing => {
                tracing::info!("Job {} already processing, resuming status polling", job_id);
                session.step = Step::Processing;
                session.poller = Some(self.spawn_poller(session.id, job_id.clone()));
            }
            JobStatus::Completed => self.shared.complete(session, &access),
            JobStatus::Failed => self.shared.fail(session),
        }

        if !status.is_terminal() {
            self.shared.events.step_changed(&job_id, session.step);
        }
        Ok(session.snapshot())
    }

    /// Selections persisted by an earlier visit, if any
    async fn saved_on_server(&self, access: &Access, job_id: &JobId) -> Option<SelectionSet> {
        match self.shared.service.selections(access, job_id).await {
            Ok(set) if !set.is_empty() => {
                tracing::info!("Job {} already has {} saved selections", job_id, set.len());
                Some(set)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("Could not load saved selections for job {}: {}", job_id, e);
                None
            }
        }
    }

    /// selecting → reviewing, after the selections are saved remotely
    pub async fn proceed(&self, selections: SelectionSet) -> Result<SessionProgress, SessionError> {
        let (session_id, job_id) = {
            let mut current = self.shared.current.lock().await;
            let session = current.as_mut().ok_or(SessionError::NoActiveSession)?;
            if selections.is_empty() {
                self.shared
                    .events
                    .notice(Notice::warning(SessionError::EmptySelection.to_string()));
                return Err(SessionError::EmptySelection);
            }
            session.check(Action::Proceed)?;
            session.busy = true;
            (session.id, session.job_id.clone())
        };

        let access = self.shared.access();
        let result = self
            .shared
            .service
            .submit_selections(&access, &job_id, &selections)
            .await;

        let mut current = self.shared.current.lock().await;
        let session = matching(&mut current, session_id)?;
        session.busy = false;

        match result {
            Ok(()) => {
                tracing::info!("Saved {} selections for job {}", selections.len(), job_id);
                session.saved = Some(selections);
                session.step = Step::Reviewing;
                self.shared.events.notice(Notice::success("Watermark selections saved"));
                self.shared.events.step_changed(&job_id, session.step);
                Ok(session.snapshot())
            }
            Err(e) => {
                self.shared.report_failure("Failed to save watermark selections", &e);
                Err(e.into())
            }
        }
    }

    /// reviewing → selecting; saved selections stay on the server
    pub async fn back(&self) -> Result<SessionProgress, SessionError> {
        let mut current = self.shared.current.lock().await;
        let session = current.as_mut().ok_or(SessionError::NoActiveSession)?;
        session.check(Action::Back)?;
        session.step = Step::Selecting;
        self.shared.events.step_changed(&session.job_id, session.step);
        Ok(session.snapshot())
    }

    /// reviewing → processing; polling begins once the service acknowledges
    pub async fn start_processing(&self) -> Result<SessionProgress, SessionError> {
        let (session_id, job_id) = {
            let mut current = self.shared.current.lock().await;
            let session = current.as_mut().ok_or(SessionError::NoActiveSession)?;
            session.check(Action::StartProcessing)?;
            session.busy = true;
            session.step = Step::Processing;
            session.progress.reset();
            self.shared.events.step_changed(&session.job_id, session.step);
            (session.id, session.job_id.clone())
        };

        let access = self.shared.access();
        let result = self.shared.service.start_processing(&access, &job_id).await;

        let mut current = self.shared.current.lock().await;
        let session = matching(&mut current, session_id)?;
        session.busy = false;

        match result {
            Ok(()) => {
                tracing::info!("Processing started for job {}", job_id);
                self.shared.events.notice(Notice::success("Processing started"));
                session.poller = Some(self.spawn_poller(session.id, job_id));
                Ok(session.snapshot())
            }
            Err(e) => {
                session.step = Step::Reviewing;
                self.shared.events.step_changed(&job_id, session.step);
                self.shared.report_failure("Failed to start processing", &e);
                Err(e.into())
            }
        }
    }

    /// Tear down the open session and its polling task
    pub async fn close(&self) {
        let mut current = self.shared.current.lock().await;
        if let Some(session) = current.take() {
            tracing::info!("Closed session for job {} at {}", session.job_id, session.step);
        }
    }

    pub async fn snapshot(&self) -> Option<SessionProgress> {
        let current = self.shared.current.lock().await;
        current.as_ref().map(ProcessingSession::snapshot)
    }

    pub async fn saved_selections(&self) -> Option<SelectionSet> {
        let current = self.shared.current.lock().await;
        current.as_ref().and_then(|session| session.saved.clone())
    }

    fn spawn_poller(&self, session_id: Uuid, job_id: JobId) -> PollTask {
        PollTask::spawn(poll_loop(
            Arc::downgrade(&self.shared),
            session_id,
            job_id,
            self.shared.poll_interval,
        ))
    }
}
