use super::Step;
use crate::identity::CompletionOutcome;
use crate::selection::Overlay;
use crate::service::JobId;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A user-visible toast
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Sink for everything the session wants the UI to know about
pub trait SessionEvents: Send + Sync {
    fn notice(&self, notice: Notice);

    fn step_changed(&self, job_id: &JobId, step: Step);

    fn progress(&self, job_id: &JobId, progress: u8);

    /// Runs once per job reaching `completed`; the outcome carries navigation
    /// or the preview rendition to present.
    fn completed(&self, job_id: &JobId, outcome: &CompletionOutcome);

    /// The selection overlay changed and must be repainted
    fn redraw(&self, overlay: &Overlay);
}
