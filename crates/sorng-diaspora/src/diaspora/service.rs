//! Central diaspora* service.
//!
//! `DiasporaService` is the caller-facing object: it owns the API client and
//! with it the one session, and routes every operation through the sign-in
//! state machine. Nothing here is global; share it through
//! [`DiasporaServiceState`] when more than one task needs it.

use crate::diaspora::api_client::DiasporaApiClient;
use crate::diaspora::auth::DiasporaAuth;
use crate::diaspora::error::{DiasporaError, DiasporaResult};
use crate::diaspora::lists::DiasporaLists;
use crate::diaspora::posts::DiasporaPosts;
use crate::diaspora::types::*;
use log::info;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Tauri-managed state wrapper.
pub type DiasporaServiceState = Arc<Mutex<DiasporaService>>;

/// diaspora* integration service.
#[derive(Debug)]
pub struct DiasporaService {
    client: DiasporaApiClient,
}

impl DiasporaService {
    /// Create a service for `pod` (a domain, no scheme).
    pub fn new(pod: &str, secure: bool) -> Self {
        Self::with_config(DiasporaConfig {
            pod: pod.to_string(),
            secure,
            ..Default::default()
        })
    }

    pub fn with_config(config: DiasporaConfig) -> Self {
        Self {
            client: DiasporaApiClient::from_config(config),
        }
    }

    /// Create the Tauri managed state with config.
    pub fn new_state_with_config(config: DiasporaConfig) -> DiasporaServiceState {
        Arc::new(Mutex::new(Self::with_config(config)))
    }

    // ── Configuration ───────────────────────────────────────────────

    pub fn config(&self) -> DiasporaConfig {
        let mut config = self.client.config().clone();
        // Reflect any re-targeting done through `init`.
        config.pod = self.client.session().pod.clone();
        config.secure = self.client.session().secure;
        config
    }

    /// Update the configuration; a different pod or scheme resets the session.
    pub fn update_config(&mut self, config: DiasporaConfig) {
        info!("Updating diaspora* configuration for {}", config.pod);
        self.client.set_config(config);
    }

    /// `scheme://pod[/path]`, path trimmed of surrounding slashes.
    pub fn get_pod_url(&self, path: &str) -> String {
        self.client.pod_url(path)
    }

    // ── Authentication ──────────────────────────────────────────────

    /// Fetch a CSRF token, optionally switching pod or scheme first.
    pub async fn init(&mut self, pod: Option<&str>, secure: Option<bool>) -> DiasporaResult<()> {
        DiasporaAuth::init(&mut self.client, pod, secure).await
    }

    pub async fn login(&mut self, username: &str, password: &str, force: bool) -> DiasporaResult<()> {
        DiasporaAuth::login(&mut self.client, username, password, force).await
    }

    pub fn logout(&mut self) {
        DiasporaAuth::logout(&mut self.client);
    }

    pub fn deinit(&mut self) {
        DiasporaAuth::deinit(&mut self.client);
    }

    pub fn is_logged_in(&self) -> bool {
        self.client.session().logged_in
    }

    pub fn state(&self) -> ConnectionState {
        self.client.session().state()
    }

    // ── Operations ──────────────────────────────────────────────────

    /// Post a status message to `aspects` (`"public"` by default).
    pub async fn post(
        &mut self,
        text: &str,
        aspects: impl Into<AspectSelection>,
        extra_fields: Map<String, Value>,
    ) -> DiasporaResult<PostResult> {
        let aspects = aspects.into();
        DiasporaPosts::create(&mut self.client, text, &aspects, extra_fields).await
    }

    /// Delete a `"post"` or `"comment"` by id.
    pub async fn delete(&mut self, kind: &str, id: &str) -> DiasporaResult<()> {
        DiasporaPosts::delete(&mut self.client, kind, id).await
    }

    pub async fn get_aspects(&mut self, force: bool) -> DiasporaResult<BTreeMap<String, String>> {
        DiasporaLists::aspects(&mut self.client, force).await
    }

    pub async fn get_services(&mut self, force: bool) -> DiasporaResult<BTreeMap<String, String>> {
        DiasporaLists::services(&mut self.client, force).await
    }

    // ── Errors ──────────────────────────────────────────────────────

    pub fn last_error(&self) -> Option<&DiasporaError> {
        self.client.session().last_error.as_ref()
    }

    pub fn has_last_error(&self) -> bool {
        self.last_error().is_some()
    }

    pub fn last_error_message(&self) -> Option<String> {
        self.last_error().map(|e| e.message.clone())
    }

    /// Snapshot of the most recent completed request.
    pub fn last_request(&self) -> Option<&NormalizedResponse> {
        self.client.session().last_request.as_ref()
    }

    /// Current CSRF token, if any.
    pub fn token(&self) -> Option<&str> {
        self.client.session().token.as_deref()
    }

    // ── Persistence hand-off ────────────────────────────────────────

    /// State a caller may persist to resume without a fresh `init`.
    pub fn export_session(&self) -> SessionSnapshot {
        self.client.session().snapshot()
    }

    /// Resume from a snapshot. The result is at most `Initialized`; a
    /// `login` is always needed afterwards.
    pub fn restore_session(&mut self, snapshot: SessionSnapshot) {
        let mut config = self.client.config().clone();
        config.pod = snapshot.pod.clone();
        config.secure = snapshot.secure;
        self.client.set_config(config);

        let session = self.client.session_mut();
        session.clear_login();
        session.token = None;
        session.set_token(snapshot.token);
        session.cookies = snapshot.cookies;
        info!("Restored session for {}", session.pod);
    }
}

// ── Tests ───────────────────────────────────────────────────────────
