// src/identity/mod.rs
// Identity - who the viewer is right now, and which endpoints that implies

mod endpoints;

pub use endpoints::{completion_outcome, resolve, Access, ApiBase, CompletionOutcome, EndpointFamily, Rendition};

use std::sync::RwLock;

pub const SIGN_IN_CALL_TO_ACTION: &str = "Sign in to download the full-quality video without the preview overlay.";

/// Snapshot of the viewer's identity at one decision point
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityContext {
    token: Option<String>,
}

impl IdentityContext {
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    pub fn authenticated(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Injected accessor, queried again at every decision point
pub trait IdentityProvider: Send + Sync {
    fn current(&self) -> IdentityContext;

    /// Called when the service rejects the current credentials
    fn revoke(&self) {}
}

/// Bearer token held for the lifetime of the app; may change mid-session.
#[derive(Debug, Default)]
pub struct TokenStore {
    token: RwLock<Option<String>>,
}

impl TokenStore {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token.filter(|t| !t.trim().is_empty())),
        }
    }

    pub fn set(&self, token: &str) {
        let trimmed = token.trim();
        if let Ok(mut guard) = self.token.write() {
            *guard = if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            };
        }
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.token.write() {
            *guard = None;
        }
    }
}

impl IdentityProvider for TokenStore {
    fn current(&self) -> IdentityContext {
        match self.token.read() {
            Ok(guard) => IdentityContext {
                token: guard.clone(),
            },
            Err(_) => IdentityContext::anonymous(),
        }
    }

    fn revoke(&self) {
        tracing::warn!("Stored token rejected by the service, continuing anonymously");
        self.clear();
    }
}
