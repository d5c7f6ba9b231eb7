// src/service/types.rs
// Remote job service types and error definitions

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

/// Server-assigned job identifier.
///
/// The service hands out integer ids on some deployments and string ids on
/// others, so both are accepted and kept as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => JobId(n.to_string()),
            RawId::Text(s) => JobId(s),
        })
    }
}

/// Lifecycle status reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Completed and failed jobs see no further automatic transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Processing => "Processing",
            JobStatus::Completed => "Completed",
            JobStatus::Failed => "Failed",
        }
    }
}

/// Client-side cache of a server job record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoJob {
    #[serde(alias = "job_id")]
    pub id: JobId,
    pub status: JobStatus,
    #[serde(default)]
    pub original_filename: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub processing_started_at: Option<String>,
    #[serde(default)]
    pub processing_completed_at: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    /// Owning account; absent for jobs uploaded anonymously
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub job_id: JobId,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadLink {
    pub download_url: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Service error types with retry classification
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Authentication failed")]
    Unauthorized,

    #[error("Sign in required for this operation")]
    AuthenticationRequired,

    #[error("Job not found")]
    NotFound,

    #[error("HTTP {status}: {detail}")]
    Http { status: u16, detail: String },

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("File error: {0}")]
    Io(String),
}

impl ServiceError {
    /// Returns true if repeating the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Network(_) | ServiceError::Timeout => true,
            ServiceError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
