use super::{IdentityContext, SIGN_IN_CALL_TO_ACTION};
use crate::service::{JobId, JobService, ServiceError};
use serde::Serialize;

/// Which of the two parallel endpoint families an operation talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointFamily {
    Authenticated,
    Anonymous,
}

impl EndpointFamily {
    pub fn upload_path(self) -> &'static str {
        match self {
            EndpointFamily::Authenticated => "/api/videos/upload",
            EndpointFamily::Anonymous => "/api/public/upload",
        }
    }

    /// `leaf` is one of `status`, `watermarks`, `process`
    pub fn job_path(self, job_id: &JobId, leaf: &str) -> String {
        match self {
            EndpointFamily::Authenticated => format!("/api/jobs/{}/{}", job_id, leaf),
            EndpointFamily::Anonymous => format!("/api/public/jobs/{}/{}", job_id, leaf),
        }
    }

    pub fn stream_path(self, job_id: &JobId, rendition: Rendition) -> String {
        let base = format!("/api/videos/{}/stream", job_id);
        match rendition {
            Rendition::Full => base,
            Rendition::Preview => format!("{}?preview=1", base),
        }
    }
}

/// Output quality served to the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rendition {
    Full,
    /// Deliberately degraded output for viewers who are not signed in
    Preview,
}

impl Rendition {
    pub fn for_family(family: EndpointFamily) -> Self {
        match family {
            EndpointFamily::Authenticated => Rendition::Full,
            EndpointFamily::Anonymous => Rendition::Preview,
        }
    }
}

/// Endpoint family plus credentials, resolved once per operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Access {
    family: EndpointFamily,
    token: Option<String>,
}

impl Access {
    pub fn family(&self) -> EndpointFamily {
        self.family
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn require_authenticated(&self) -> Result<&str, ServiceError> {
        match (&self.family, self.token.as_deref()) {
            (EndpointFamily::Authenticated, Some(token)) => Ok(token),
            _ => Err(ServiceError::AuthenticationRequired),
        }
    }
}

/// The one place that maps an identity to an endpoint family
pub fn resolve(identity: &IdentityContext) -> Access {
    match identity.token() {
        Some(token) => Access {
            family: EndpointFamily::Authenticated,
            token: Some(token.to_string()),
        },
        None => Access {
            family: EndpointFamily::Anonymous,
            token: None,
        },
    }
}

/// API origin with any trailing slash removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiBase(String);

impl ApiBase {
    pub fn new(base_url: &str) -> Self {
        Self(base_url.trim().trim_end_matches('/').to_string())
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.0, path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// What the client does once a job reaches `completed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CompletionOutcome {
    NavigateToDashboard,
    #[serde(rename_all = "camelCase")]
    ShowPreview {
        stream_url: String,
        call_to_action: String,
    },
}

/// Branch taken on completion, using the access of the operation that saw it
pub fn completion_outcome(access: &Access, job_id: &JobId, service: &dyn JobService) -> CompletionOutcome {
    match access.family() {
        EndpointFamily::Authenticated => CompletionOutcome::NavigateToDashboard,
        EndpointFamily::Anonymous => CompletionOutcome::ShowPreview {
            stream_url: service.stream_url(access, job_id, Rendition::Preview),
            call_to_action: SIGN_IN_CALL_TO_ACTION.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::HttpJobService;

    #[test]
    fn resolve_follows_token_presence() {
        let anon = resolve(&IdentityContext::anonymous());
        assert_eq!(anon.family(), EndpointFamily::Anonymous);
        assert!(anon.token().is_none());

        let authed = resolve(&IdentityContext::authenticated("t0k"));
        assert_eq!(authed.family(), EndpointFamily::Authenticated);
        assert_eq!(authed.require_authenticated().unwrap(), "t0k");
    }

    #[test]
    fn anonymous_access_cannot_reach_account_operations() {
        let anon = resolve(&IdentityContext::anonymous());
        assert!(matches!(
            anon.require_authenticated(),
            Err(ServiceError::AuthenticationRequired)
        ));
    }

    #[test]
    fn api_base_drops_trailing_slash() {
        assert_eq!(ApiBase::new(" https://api.example.test/ ").url("/api/jobs"), "https://api.example.test/api/jobs");
    }

    #[test]
    fn families_use_distinct_base_paths() {
        let id = JobId::new("9");
        assert_eq!(EndpointFamily::Authenticated.job_path(&id, "status"), "/api/jobs/9/status");
        assert_eq!(EndpointFamily::Anonymous.job_path(&id, "status"), "/api/public/jobs/9/status");
        assert_eq!(EndpointFamily::Authenticated.upload_path(), "/api/videos/upload");
        assert_eq!(EndpointFamily::Anonymous.upload_path(), "/api/public/upload");
    }

    #[test]
    fn anonymous_completion_shows_preview_stream() {
        let service = HttpJobService::new("http://localhost:8000/").unwrap();
        let outcome = completion_outcome(&resolve(&IdentityContext::anonymous()), &JobId::new("5"), &service);

        match outcome {
            CompletionOutcome::ShowPreview { stream_url, call_to_action } => {
                assert_eq!(stream_url, "http://localhost:8000/api/videos/5/stream?preview=1");
                assert!(!call_to_action.is_empty());
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn authenticated_completion_navigates_without_preview() {
        let service = HttpJobService::new("http://localhost:8000").unwrap();
        let outcome = completion_outcome(&resolve(&IdentityContext::authenticated("t")), &JobId::new("5"), &service);
        assert_eq!(outcome, CompletionOutcome::NavigateToDashboard);
        assert_eq!(Rendition::for_family(EndpointFamily::Authenticated), Rendition::Full);
    }
}
