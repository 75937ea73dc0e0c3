//! Core types for the diaspora* integration.
//!
//! Session state, configuration, normalized responses, and the small value
//! types the operations are parameterized with.

use crate::diaspora::error::DiasporaError;
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of the synthetic aspect every post may target.
pub const PUBLIC_ASPECT_ID: &str = "public";
/// Display name of the synthetic public aspect.
pub const PUBLIC_ASPECT_NAME: &str = "Public";

// ── Configuration ───────────────────────────────────────────────────

/// diaspora* connection and behaviour configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiasporaConfig {
    /// Pod domain (e.g. `pod.example.org`), no scheme.
    pub pod: String,
    /// Use `https` (true) or `http` (false).
    pub secure: bool,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Whether to verify TLS certificates.
    pub verify_tls: bool,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Sent as `provider_display_name` with every status message.
    pub provider_name: String,
}

impl Default for DiasporaConfig {
    fn default() -> Self {
        Self {
            pod: String::new(),
            secure: true,
            request_timeout_secs: 60,
            verify_tls: true,
            user_agent: format!("sorng-diaspora/{}", env!("CARGO_PKG_VERSION")),
            provider_name: "SortOfRemote NG".into(),
        }
    }
}

/// Strip any scheme and trailing slashes from a pod address.
pub fn normalize_pod(pod: &str) -> String {
    let pod = pod.trim();
    let pod = pod
        .strip_prefix("https://")
        .or_else(|| pod.strip_prefix("http://"))
        .unwrap_or(pod);
    pod.trim_end_matches('/').to_string()
}

// ── Session ─────────────────────────────────────────────────────────

/// Where the session is in the sign-in state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No token fetched yet.
    Uninitialized,
    /// Token present, not signed in.
    Initialized,
    /// Verified, signed-in session.
    LoggedIn,
}

/// Snapshot of a completed HTTP exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedResponse {
    pub status_code: u16,
    pub status_message: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl NormalizedResponse {
    /// Decode the body as JSON, `None` if it is not valid for `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Salted digest of the last accepted credentials.
///
/// Only used to recognise a repeated `login` with identical credentials; the
/// plaintext password is never retained.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialVerifier {
    username: String,
    salt: String,
    digest: String,
}

impl CredentialVerifier {
    pub fn new(username: &str, password: &str) -> Self {
        let salt: [u8; 16] = rand::random();
        let salt = hex::encode(salt);
        let digest = Self::digest(&salt, password);
        Self {
            username: username.to_string(),
            salt,
            digest,
        }
    }

    fn digest(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Whether `username`/`password` are the credentials this was built from.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && Self::digest(&self.salt, password) == self.digest
    }
}

impl fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("username", &self.username)
            .field("digest", &"[REDACTED]")
            .finish()
    }
}

/// The single mutable session of a client.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub pod: String,
    pub secure: bool,
    pub token: Option<String>,
    pub cookies: BTreeMap<String, String>,
    pub last_request: Option<NormalizedResponse>,
    pub logged_in: bool,
    pub credentials: Option<CredentialVerifier>,
    pub aspects_cache: BTreeMap<String, String>,
    pub services_cache: BTreeMap<String, String>,
    pub last_error: Option<DiasporaError>,
}

impl SessionState {
    pub fn new(pod: &str, secure: bool) -> Self {
        Self {
            pod: normalize_pod(pod),
            secure,
            ..Default::default()
        }
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    /// `scheme://pod[/path]`, with `path` trimmed of surrounding slashes.
    pub fn pod_url(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        if path.is_empty() {
            format!("{}://{}", self.scheme(), self.pod)
        } else {
            format!("{}://{}/{}", self.scheme(), self.pod, path)
        }
    }

    /// Store a scraped token. Empty values never replace a known token.
    pub fn set_token(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.token = Some(token);
        }
    }

    /// Replace the jar with the server-supplied set, if it supplied any.
    pub fn replace_cookies(&mut self, cookies: BTreeMap<String, String>) {
        if !cookies.is_empty() {
            self.cookies = cookies;
        }
    }

    /// `Cookie` request header value, `None` when the jar is empty.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    pub fn state(&self) -> ConnectionState {
        if self.logged_in {
            ConnectionState::LoggedIn
        } else if self.token.is_some() {
            ConnectionState::Initialized
        } else {
            ConnectionState::Uninitialized
        }
    }

    /// Clear sign-in fields and caches; token and cookies survive.
    pub fn clear_login(&mut self) {
        self.logged_in = false;
        self.credentials = None;
        self.aspects_cache.clear();
        self.services_cache.clear();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            pod: self.pod.clone(),
            secure: self.secure,
            token: self.token.clone(),
            cookies: self.cookies.clone(),
        }
    }
}

/// Opaque session state a caller may persist across process restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub pod: String,
    pub secure: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
}

// ── Operation parameters ────────────────────────────────────────────

/// What a DELETE can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteTarget {
    Post,
    Comment,
}

impl DeleteTarget {
    /// Parse `"post"` or `"comment"`.
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "post" => Some(Self::Post),
            "comment" => Some(Self::Comment),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }

    /// Path of the item on the pod, e.g. `/posts/42`. `None` unless `id` is
    /// a single plain path segment.
    pub fn path(&self, id: &str) -> Option<String> {
        let plain = !id.is_empty()
            && id != "."
            && id != ".."
            && !id.contains(|c: char| {
                matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_whitespace()
            });
        plain.then(|| format!("/{}s/{}", self.as_str(), id))
    }
}

impl fmt::Display for DeleteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audience of a status message.
///
/// `public` is exclusive: any selection that is empty or mentions it
/// collapses to [`AspectSelection::Public`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AspectSelection {
    #[default]
    Public,
    Aspects(Vec<String>),
}

impl AspectSelection {
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set: Vec<String> = ids
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        set.sort();
        set.dedup();
        if set.is_empty() || set.iter().any(|s| s == PUBLIC_ASPECT_ID) {
            Self::Public
        } else {
            Self::Aspects(set)
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Self::Public)
    }
}

impl From<&str> for AspectSelection {
    fn from(list: &str) -> Self {
        Self::from_ids(list.split(','))
    }
}

impl From<String> for AspectSelection {
    fn from(list: String) -> Self {
        Self::from(list.as_str())
    }
}

impl From<Vec<String>> for AspectSelection {
    fn from(ids: Vec<String>) -> Self {
        Self::from_ids(ids)
    }
}

impl From<&[&str]> for AspectSelection {
    fn from(ids: &[&str]) -> Self {
        Self::from_ids(ids.iter().copied())
    }
}

impl Serialize for AspectSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Public => serializer.serialize_str(PUBLIC_ASPECT_ID),
            Self::Aspects(ids) => ids.serialize(serializer),
        }
    }
}

/// Which cached lookup list to work on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListKind {
    Aspects,
    Services,
}

/// An aspect as embedded in the bookmarklet page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectEntry {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub name: String,
}

fn id_as_string<'de, D: serde::Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(d)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "unexpected aspect id {}",
            other
        ))),
    }
}

/// Status message body sent to `/status_messages`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusMessage {
    pub text: String,
    pub provider_display_name: String,
}

/// Decoded `201 Created` answer to a status message, plus its permalink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostResult {
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub permalink: String,
    /// Every other field the pod returned.
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

// ── Tests ───────────────────────────────────────────────────────────
