//! Sign-in state machine for a diaspora* pod.
//!
//! `Uninitialized` → `Initialized` → `LoggedIn`.
//!
//! ## Flow
//! 1. `GET /users/sign_in`: scrape the CSRF token (init)
//! 2. `POST /users/sign_in`: `user[username]`, `user[password]`,
//!    `authenticity_token` as form fields
//! 3. `GET /bookmarklet`: only an exact 200 proves the session took; the
//!    sign-in POST answers 200 or a redirect whether or not it worked

use crate::diaspora::api_client::{DiasporaApiClient, RequestOptions, BOOKMARKLET_PATH, SIGN_IN_PATH};
use crate::diaspora::error::{DiasporaError, DiasporaResult, HELP_TROUBLESHOOTING};
use crate::diaspora::types::*;
use log::{debug, info};

/// diaspora* authenticator.
pub struct DiasporaAuth;

impl DiasporaAuth {
    /// Obtain a token, optionally re-targeting the client first.
    ///
    /// A different pod or scheme drops the old token, cookies and sign-in so
    /// that only a token from the new target counts as success.
    pub async fn init(
        client: &mut DiasporaApiClient,
        pod: Option<&str>,
        secure: Option<bool>,
    ) -> DiasporaResult<()> {
        client.session_mut().last_error = None;

        let mut force = false;
        {
            let session = client.session_mut();
            if let Some(pod) = pod.map(normalize_pod) {
                if pod != session.pod {
                    session.pod = pod;
                    force = true;
                }
            }
            if let Some(secure) = secure {
                if secure != session.secure {
                    session.secure = secure;
                    force = true;
                }
            }
            if force {
                session.clear_login();
                session.token = None;
                session.cookies.clear();
            }
        }

        let pod_url = client.pod_url("");
        if client.fetch_token(force).await.is_some() {
            info!("Connection to {} initialized", pod_url);
            return Ok(());
        }

        let transport = client
            .session()
            .last_error
            .as_ref()
            .map(|e| e.message.clone());
        let mut err = DiasporaError::init_failed(format!(
            "Failed to initialise connection to pod \"{}\".",
            pod_url
        ))
        .with_help_topic(HELP_TROUBLESHOOTING);
        if let Some(transport) = transport {
            err = err.with_detail(transport);
        }
        Err(client.report(err))
    }

    /// Sign in and verify the session against a session-gated page.
    pub async fn login(
        client: &mut DiasporaApiClient,
        username: &str,
        password: &str,
        force: bool,
    ) -> DiasporaResult<()> {
        if client.session().state() == ConnectionState::Uninitialized {
            Self::logout(client);
            return Err(client.report(DiasporaError::not_initialized()));
        }

        if username.trim().is_empty() || password.trim().is_empty() {
            Self::logout(client);
            let err = DiasporaError::login_failed("Invalid credentials. Please re-save your login info.")
                .with_help_topic(HELP_TROUBLESHOOTING);
            return Err(client.report(err));
        }

        let session = client.session();
        let same_credentials = session
            .credentials
            .as_ref()
            .map(|c| c.matches(username, password))
            .unwrap_or(false);
        if session.logged_in && !force && same_credentials {
            debug!("Already logged in as {}", username);
            return Ok(());
        }

        let session = client.session_mut();
        session.logged_in = false;
        session.credentials = Some(CredentialVerifier::new(username, password));
        let token = session.token.clone().unwrap_or_default();

        info!("Signing in to {} as {}", client.pod_url(""), username);
        let form = vec![
            ("user[username]".to_string(), username.to_string()),
            ("user[password]".to_string(), password.to_string()),
            ("authenticity_token".to_string(), token),
        ];
        let verified = match client
            .execute(SIGN_IN_PATH, RequestOptions::post_form(form))
            .await
        {
            Ok(_) => client
                .execute(BOOKMARKLET_PATH, RequestOptions::get())
                .await
                .map(|probe| probe.status_code == 200),
            Err(e) => Err(e),
        };

        match verified {
            Ok(true) => {
                client.session_mut().logged_in = true;
                info!("Logged in to {} as {}", client.pod_url(""), username);
                Ok(())
            }
            outcome => {
                Self::logout(client);
                let mut err =
                    DiasporaError::login_failed("Login failed. Check your login details.")
                        .with_help_topic(HELP_TROUBLESHOOTING);
                if let Err(transport) = outcome {
                    err = err.with_detail(transport.message);
                }
                Err(client.report(err))
            }
        }
    }

    /// Drop the sign-in and cached lists; token and cookies are kept.
    pub fn logout(client: &mut DiasporaApiClient) {
        let session = client.session_mut();
        if session.logged_in {
            info!("Logged out of {}", session.pod);
        }
        session.clear_login();
    }

    /// Return to the constructor-equivalent state.
    pub fn deinit(client: &mut DiasporaApiClient) {
        Self::logout(client);
        let session = client.session_mut();
        session.last_error = None;
        session.token = None;
        session.cookies.clear();
        session.last_request = None;
        debug!("Session for {} reset", session.pod);
    }
}

// ── Tests ───────────────────────────────────────────────────────────
