use crate::service::ServiceError;
use serde::Serialize;
use std::fmt;

/// Where a processing session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Selecting,
    Reviewing,
    Processing,
    Completed,
    Failed,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Selecting => "selecting",
            Step::Reviewing => "reviewing",
            Step::Processing => "processing",
            Step::Completed => "completed",
            Step::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// User-initiated transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Proceed,
    Back,
    StartProcessing,
}

impl Action {
    /// The only step each action is accepted from
    pub fn accepted_from(self) -> Step {
        match self {
            Action::Proceed => Step::Selecting,
            Action::Back => Step::Reviewing,
            Action::StartProcessing => Step::Reviewing,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No job is open")]
    NoActiveSession,

    #[error("Please select at least one watermark area")]
    EmptySelection,

    #[error("A request is already in progress")]
    Busy,

    #[error("Cannot {action:?} while {step}")]
    InvalidTransition { step: Step, action: Action },

    #[error("Session was closed before the response arrived")]
    Stale,

    #[error(transparent)]
    Service(#[from] ServiceError),
}
