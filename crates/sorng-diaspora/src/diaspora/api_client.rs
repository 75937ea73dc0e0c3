//! HTTP request executor for a diaspora* pod.
//!
//! Handles all low-level HTTP communication including:
//! - URL resolution against the current pod and scheme
//! - Cookie-jar propagation (redirects are never followed)
//! - CSRF token scraping from every completed response
//! - Last-request snapshots and the structured last-error reporter

use crate::diaspora::error::{DiasporaError, DiasporaResult};
use crate::diaspora::patterns::{extract_pattern, PatternKey};
use crate::diaspora::types::*;
use log::{debug, warn};
use reqwest::header::COOKIE;
use reqwest::redirect::Policy;
use reqwest::{Client, Method};
use std::collections::BTreeMap;
use std::time::Duration;

/// Sign-in page; also the page the token is scraped from.
pub const SIGN_IN_PATH: &str = "/users/sign_in";
/// Session-gated page embedding the aspect and service lists.
pub const BOOKMARKLET_PATH: &str = "/bookmarklet";
/// Status message creation endpoint.
pub const STATUS_MESSAGES_PATH: &str = "/status_messages";

const APPLICATION_JSON: &str = "application/json";
const CSRF_HEADER: &str = "X-CSRF-Token";

/// Request payload.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// `application/x-www-form-urlencoded` fields, sent in order.
    Form(Vec<(String, String)>),
    Json(serde_json::Value),
}

/// Method, extra headers and body of a single request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(&'static str, String)>,
    pub body: RequestBody,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn delete() -> Self {
        Self {
            method: Method::DELETE,
            ..Self::get()
        }
    }

    pub fn post_form(fields: Vec<(String, String)>) -> Self {
        Self {
            method: Method::POST,
            headers: Vec::new(),
            body: RequestBody::Form(fields),
        }
    }

    pub fn post_json(body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            headers: Vec::new(),
            body: RequestBody::Json(body),
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// JSON `Accept`/`Content-Type` plus the CSRF header.
    pub fn json_api(self, token: &str) -> Self {
        self.header("Accept", APPLICATION_JSON)
            .header("Content-Type", APPLICATION_JSON)
            .header(CSRF_HEADER, token)
    }
}

/// diaspora* pod client: one HTTP client plus the session it mutates.
#[derive(Debug)]
pub struct DiasporaApiClient {
    /// HTTP client; `None` if it could not be built.
    http: Option<Client>,
    /// Session state.
    session: SessionState,
    /// Configuration the HTTP client was built from.
    config: DiasporaConfig,
}

/// Build a client that never follows redirects.
fn build_http_client(config: &DiasporaConfig) -> DiasporaResult<Client> {
    Client::builder()
        .redirect(Policy::none())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .danger_accept_invalid_certs(!config.verify_tls)
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(|e| DiasporaError::transport(format!("Failed to build HTTP client: {}", e)))
}

impl DiasporaApiClient {
    /// Create a client from a `DiasporaConfig`.
    pub fn from_config(config: DiasporaConfig) -> Self {
        let http = match build_http_client(&config) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("{}", e.message);
                None
            }
        };
        Self {
            http,
            session: SessionState::new(&config.pod, config.secure),
            config,
        }
    }

    pub fn config(&self) -> &DiasporaConfig {
        &self.config
    }

    /// Swap the configuration. A different pod or scheme resets the session,
    /// except for the last error.
    pub fn set_config(&mut self, config: DiasporaConfig) {
        let retarget = normalize_pod(&config.pod) != self.session.pod
            || config.secure != self.session.secure;
        let session = if retarget {
            let mut fresh = SessionState::new(&config.pod, config.secure);
            fresh.last_error = self.session.last_error.take();
            fresh
        } else {
            std::mem::take(&mut self.session)
        };
        let mut fresh = Self::from_config(config);
        fresh.session = session;
        *self = fresh;
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    /// `scheme://pod[/path]`.
    pub fn pod_url(&self, path: &str) -> String {
        self.session.pod_url(path)
    }

    /// Absolute URLs pass through, anything else is rooted at the pod.
    fn resolve_url(&self, path: &str) -> String {
        match url::Url::parse(path) {
            Ok(u) if u.scheme() == "http" || u.scheme() == "https" => path.to_string(),
            _ => self.session.pod_url(path),
        }
    }

    // ── Execution ───────────────────────────────────────────────────

    /// Issue one request and normalize the response.
    ///
    /// Any completed exchange, whatever its status, updates the token, the
    /// cookie jar and the last-request snapshot. Transport failures touch
    /// none of those and are recorded as the last error.
    pub async fn execute(
        &mut self,
        path: &str,
        options: RequestOptions,
    ) -> DiasporaResult<NormalizedResponse> {
        let url = self.resolve_url(path);
        let Some(http) = self.http.as_ref() else {
            let err = DiasporaError::transport("HTTP client is not available");
            return Err(self.report(err));
        };
        debug!("{} {}", options.method, url);

        let mut builder = http.request(options.method, &url);
        for (name, value) in &options.headers {
            builder = builder.header(*name, value.as_str());
        }
        if let Some(cookie) = self.session.cookie_header() {
            builder = builder.header(COOKIE, cookie);
        }
        builder = match options.body {
            RequestBody::Empty => builder,
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Json(body) => builder.json(&body),
        };

        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => {
                let err = DiasporaError::transport(format!("Request to {} failed: {}", url, e));
                return Err(self.report(err));
            }
        };

        let status = response.status();
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in response.headers() {
            let v = String::from_utf8_lossy(value.as_bytes());
            headers
                .entry(name.to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&v);
                })
                .or_insert_with(|| v.into_owned());
        }
        let cookies: BTreeMap<String, String> = response
            .cookies()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect();

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                let err = DiasporaError::transport(format!(
                    "Failed to read response body from {}: {}",
                    url, e
                ));
                return Err(self.report(err));
            }
        };

        debug!("{} -> {}", url, status.as_u16());
        self.session
            .set_token(extract_pattern(&body, PatternKey::CsrfToken));
        self.session.replace_cookies(cookies);

        let normalized = NormalizedResponse {
            status_code: status.as_u16(),
            status_message: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        };
        self.session.last_request = Some(normalized.clone());
        Ok(normalized)
    }

    /// Fetch a token from the sign-in page if none is held or `force` is set.
    pub async fn fetch_token(&mut self, force: bool) -> Option<String> {
        if self.session.token.is_none() || force {
            // Outcome is judged by whether a token was scraped.
            let _ = self.execute(SIGN_IN_PATH, RequestOptions::get()).await;
        }
        self.session.token.clone()
    }

    // ── Error reporting ─────────────────────────────────────────────

    /// Attach the last request's status to `err` and keep it as last error.
    pub fn report(&mut self, mut err: DiasporaError) -> DiasporaError {
        if let Some(last) = &self.session.last_request {
            err.context.status_code = Some(last.status_code);
            err.context.status_message = Some(last.status_message.clone());
        }
        warn!("{}: {}", err.code(), err.message);
        self.session.last_error = Some(err.clone());
        err
    }

    /// Fail with `ConnectionNotInitialized`/`NotLoggedIn` unless signed in.
    pub fn require_login(&mut self) -> DiasporaResult<()> {
        match self.session.state() {
            ConnectionState::LoggedIn => Ok(()),
            ConnectionState::Initialized => Err(self.report(DiasporaError::not_logged_in())),
            ConnectionState::Uninitialized => Err(self.report(DiasporaError::not_initialized())),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diaspora::error::DiasporaErrorKind;

    fn client(pod: &str, secure: bool) -> DiasporaApiClient {
        DiasporaApiClient::from_config(DiasporaConfig {
            pod: pod.into(),
            secure,
            ..Default::default()
        })
    }

    #[test]
    fn test_resolve_url() {
        let c = client("example.org", true);
        assert_eq!(c.resolve_url("/users/sign_in"), "https://example.org/users/sign_in");
        assert_eq!(
            c.resolve_url("http://other.example/x"),
            "http://other.example/x"
        );
        let c = client("localhost:3000", false);
        assert_eq!(c.resolve_url("bookmarklet"), "http://localhost:3000/bookmarklet");
    }

    #[test]
    fn test_report_attaches_last_request() {
        let mut c = client("example.org", true);
        c.session_mut().last_request = Some(NormalizedResponse {
            status_code: 302,
            status_message: "Found".into(),
            ..Default::default()
        });
        let err = c.report(DiasporaError::not_logged_in());
        assert_eq!(err.context.status_code, Some(302));
        assert_eq!(err.context.status_message.as_deref(), Some("Found"));
        assert_eq!(c.session().last_error.as_ref(), Some(&err));
    }

    #[test]
    fn test_require_login() {
        let mut c = client("example.org", true);
        let err = c.require_login().unwrap_err();
        assert_eq!(err.kind, DiasporaErrorKind::ConnectionNotInitialized);
        c.session_mut().set_token(Some("t".into()));
        let err = c.require_login().unwrap_err();
        assert_eq!(err.kind, DiasporaErrorKind::NotLoggedIn);
        c.session_mut().logged_in = true;
        assert!(c.require_login().is_ok());
    }

    #[test]
    fn test_set_config_retarget_resets_session() {
        let mut c = client("example.org", true);
        c.session_mut().set_token(Some("t".into()));

        let same = DiasporaConfig {
            pod: "https://example.org/".into(),
            request_timeout_secs: 5,
            ..Default::default()
        };
        c.set_config(same);
        assert_eq!(c.session().token.as_deref(), Some("t"));
        assert_eq!(c.config().request_timeout_secs, 5);

        let other = DiasporaConfig {
            pod: "other.example".into(),
            ..Default::default()
        };
        c.set_config(other);
        assert!(c.session().token.is_none());
        assert_eq!(c.pod_url(""), "https://other.example");
    }

    #[test]
    fn test_set_config_retarget_keeps_last_error() {
        let mut c = client("example.org", true);
        c.report(DiasporaError::not_logged_in());
        c.set_config(DiasporaConfig {
            pod: "other.example".into(),
            ..Default::default()
        });
        assert_eq!(
            c.session().last_error.as_ref().map(|e| e.kind),
            Some(DiasporaErrorKind::NotLoggedIn)
        );
    }

    #[tokio::test]
    async fn test_transport_failure_leaves_session_untouched() {
        let mut c = client("example.org", true);
        let previous = NormalizedResponse {
            status_code: 200,
            status_message: "OK".into(),
            ..Default::default()
        };
        {
            let s = c.session_mut();
            s.set_token(Some("tok".into()));
            s.replace_cookies(BTreeMap::from([("_s".to_string(), "1".to_string())]));
            s.last_request = Some(previous.clone());
        }

        // Nothing listens on the discard port.
        let err = c
            .execute("http://127.0.0.1:9/users/sign_in", RequestOptions::get())
            .await
            .unwrap_err();
        assert_eq!(err.kind, DiasporaErrorKind::TransportError);
        assert!(err.message.contains("127.0.0.1:9"));
        assert_eq!(err.context.status_code, Some(200));

        let s = c.session();
        assert_eq!(s.token.as_deref(), Some("tok"));
        assert_eq!(s.cookie_header().as_deref(), Some("_s=1"));
        assert_eq!(s.last_request.as_ref(), Some(&previous));
        assert_eq!(s.last_error.as_ref(), Some(&err));
    }

    #[test]
    fn test_json_api_headers() {
        let opts = RequestOptions::delete().json_api("tok");
        assert_eq!(opts.method, Method::DELETE);
        assert!(opts
            .headers
            .iter()
            .any(|(k, v)| *k == "X-CSRF-Token" && v == "tok"));
        assert!(opts.headers.iter().any(|(k, _)| *k == "Accept"));
    }
}
