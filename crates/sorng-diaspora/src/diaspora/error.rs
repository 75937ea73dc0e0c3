//! diaspora* error types.
//!
//! Errors are values, not control flow: every operation returns a
//! `DiasporaResult` and the same error is kept as the session's last error
//! so a caller can inspect it after the fact.

use crate::diaspora::types::DeleteTarget;
use serde::{Deserialize, Serialize};

/// Help topic attached to errors where the user should check their setup.
pub const HELP_TROUBLESHOOTING: &str = "troubleshooting";

/// diaspora*-specific error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiasporaErrorKind {
    /// No token was ever fetched from the pod.
    ConnectionNotInitialized,
    /// The session is initialized but not signed in.
    NotLoggedIn,
    /// Fetching the initial CSRF token failed.
    InitFailed,
    /// Sign-in or its verification probe failed.
    LoginFailed,
    /// Creating a status message failed.
    PostFailed,
    /// Deleting a post or comment failed for a known reason.
    DeleteFailed(DeleteTarget),
    /// Loading the aspects list failed.
    AspectsFetchFailed,
    /// Loading the connected services list failed.
    ServicesFetchFailed,
    /// Something other than a post or comment was asked to be deleted.
    InvalidDeleteTarget,
    /// The pod answered with a status this client has no mapping for.
    UnknownRemoteError,
    /// DNS, connect, TLS, timeout or body read failure.
    TransportError,
}

impl DiasporaErrorKind {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConnectionNotInitialized => "diaspora_connection_not_initialized",
            Self::NotLoggedIn => "diaspora_not_logged_in",
            Self::InitFailed => "diaspora_init_failed",
            Self::LoginFailed => "diaspora_login_failed",
            Self::PostFailed => "diaspora_post_failed",
            Self::DeleteFailed(DeleteTarget::Post) => "diaspora_delete_post_failed",
            Self::DeleteFailed(DeleteTarget::Comment) => "diaspora_delete_comment_failed",
            Self::AspectsFetchFailed => "diaspora_aspects_fetch_failed",
            Self::ServicesFetchFailed => "diaspora_services_fetch_failed",
            Self::InvalidDeleteTarget => "diaspora_invalid_delete_target",
            Self::UnknownRemoteError => "diaspora_unknown_remote_error",
            Self::TransportError => "diaspora_transport_error",
        }
    }
}

/// Debugging context carried by every error.
///
/// `status_code`/`status_message` describe the last completed request, even
/// when the error itself was raised before any request was made.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A diaspora* integration error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct DiasporaError {
    pub kind: DiasporaErrorKind,
    pub message: String,
    #[serde(default)]
    pub context: ErrorContext,
}

/// Convenience Result alias.
pub type DiasporaResult<T> = Result<T, DiasporaError>;

impl From<DiasporaError> for String {
    fn from(e: DiasporaError) -> String {
        e.message
    }
}

impl DiasporaError {
    pub fn new(kind: DiasporaErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn not_initialized() -> Self {
        Self::new(
            DiasporaErrorKind::ConnectionNotInitialized,
            "Connection not initialized.",
        )
    }
    pub fn not_logged_in() -> Self {
        Self::new(DiasporaErrorKind::NotLoggedIn, "Not logged in.")
    }
    pub fn init_failed(msg: impl Into<String>) -> Self {
        Self::new(DiasporaErrorKind::InitFailed, msg)
    }
    pub fn login_failed(msg: impl Into<String>) -> Self {
        Self::new(DiasporaErrorKind::LoginFailed, msg)
    }
    pub fn post_failed(msg: impl Into<String>) -> Self {
        Self::new(DiasporaErrorKind::PostFailed, msg)
    }
    pub fn delete_failed(target: DeleteTarget, msg: impl Into<String>) -> Self {
        Self::new(DiasporaErrorKind::DeleteFailed(target), msg)
    }
    pub fn aspects_fetch_failed(msg: impl Into<String>) -> Self {
        Self::new(DiasporaErrorKind::AspectsFetchFailed, msg)
    }
    pub fn services_fetch_failed(msg: impl Into<String>) -> Self {
        Self::new(DiasporaErrorKind::ServicesFetchFailed, msg)
    }
    pub fn invalid_delete_target(what: &str) -> Self {
        Self::new(
            DiasporaErrorKind::InvalidDeleteTarget,
            format!("Invalid delete target \"{}\", expected \"post\" or \"comment\".", what),
        )
    }
    pub fn invalid_delete_id(target: DeleteTarget, id: &str) -> Self {
        Self::new(
            DiasporaErrorKind::InvalidDeleteTarget,
            format!("Invalid {} id \"{}\".", target, id),
        )
    }
    pub fn unknown_remote() -> Self {
        Self::new(DiasporaErrorKind::UnknownRemoteError, "Unknown error occurred.")
    }
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::new(DiasporaErrorKind::TransportError, msg)
    }

    /// Attach a help topic for the host UI.
    pub fn with_help_topic(mut self, topic: impl Into<String>) -> Self {
        self.context.help_topic = Some(topic.into());
        self
    }

    /// Attach free-form detail, typically an underlying transport message.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.context.detail = Some(detail.into());
        self
    }

    /// Stable code of this error's kind.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct_per_delete_target() {
        assert_ne!(
            DiasporaErrorKind::DeleteFailed(DeleteTarget::Post).code(),
            DiasporaErrorKind::DeleteFailed(DeleteTarget::Comment).code()
        );
    }

    #[test]
    fn test_display_is_message() {
        let err = DiasporaError::login_failed("Login failed. Check your credentials.");
        assert_eq!(err.to_string(), "Login failed. Check your credentials.");
        assert_eq!(err.code(), "diaspora_login_failed");
    }

    #[test]
    fn test_builders_fill_context() {
        let err = DiasporaError::init_failed("boom")
            .with_help_topic(HELP_TROUBLESHOOTING)
            .with_detail("connection refused");
        assert_eq!(err.context.help_topic.as_deref(), Some("troubleshooting"));
        assert_eq!(err.context.detail.as_deref(), Some("connection refused"));
        assert!(err.context.status_code.is_none());
    }

    #[test]
    fn test_serialize_skips_empty_context_fields() {
        let err = DiasporaError::not_logged_in();
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "NotLoggedIn");
        assert!(json["context"].get("status_code").is_none());
    }

    #[test]
    fn test_into_string() {
        let s: String = DiasporaError::unknown_remote().into();
        assert_eq!(s, "Unknown error occurred.");
    }
}
