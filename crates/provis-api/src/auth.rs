// Authentication flows
//
// Entra ID token exchange, token refresh, validation of a restored
// session, logout, and refresh-session management. Login, refresh and
// logout talk to the backend directly instead of going through
// `ApiClient::execute`, so a 401 on them never recurses into a refresh.

use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::client::{ApiClient, ApiRequest};
use crate::error::Error;
use crate::models::{LoginResponse, RefreshSession, User};

/// How hard `refresh_access_token` tries before giving up.
#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    pub max_attempts: u32,
    /// Delay before attempt `n + 1` is `backoff * n`.
    pub backoff: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(250),
        }
    }
}

impl RefreshPolicy {
    /// Retry immediately, for tests and non-interactive use.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Duration::ZERO,
        }
    }
}

impl ApiClient {
    /// Exchange an Entra ID token for a backend session.
    ///
    /// `POST /auth/sso/entraId/login` with the identity token as bearer.
    pub async fn login_with_entra_id(&self, identity_token: &SecretString) -> Result<User, Error> {
        let url = self.url("auth/sso/entraId/login")?;
        debug!("logging in at {url}");

        let resp = self
            .http()
            .post(url)
            .bearer_auth(identity_token.expose_secret())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status})"),
            });
        }

        let body: LoginResponse = self.read_body(resp).await?;
        let (token, user) = body.into_parts();
        self.session().establish(token, user.clone());

        info!(user = %user.email, "signed in");
        Ok(user)
    }

    /// End the session. The server call is best-effort; local state is
    /// always reset.
    ///
    /// `POST /auth/logout`
    pub async fn logout(&self) {
        self.end_session(self.session().token()).await;
    }

    /// Server-side logout with `token`, then reset local state.
    pub(crate) async fn end_session(&self, token: Option<SecretString>) {
        match self.url("auth/logout") {
            Ok(url) => {
                let mut builder = self.http().post(url);
                if let Some(token) = token {
                    builder = builder.bearer_auth(token.expose_secret());
                }
                match builder.send().await {
                    Ok(resp) if !resp.status().is_success() => {
                        debug!(status = %resp.status(), "server-side logout rejected; ignoring");
                    }
                    Ok(_) => {}
                    Err(e) => debug!(error = %e, "server-side logout failed; ignoring"),
                }
            }
            Err(e) => debug!(error = %e, "invalid logout URL; skipping server call"),
        }

        self.session().clear();
        info!("signed out");
    }

    /// Obtain a fresh session token.
    ///
    /// Returns `None` without a network call when no token is held. A 404
    /// means the refresh token is gone: the session is cleared at once.
    /// Other failures are retried up to the policy's attempt limit, after
    /// which the session is cleared. A transport failure that is not
    /// transient ends the retries early.
    ///
    /// `POST /auth/refresh`
    pub async fn refresh_access_token(&self) -> Option<SecretString> {
        let current = self.session().token()?;

        let url = match self.url("auth/refresh") {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "invalid refresh URL");
                self.session().clear();
                return None;
            }
        };

        let policy = self.refresh_policy().clone();
        for attempt in 1..=policy.max_attempts {
            let result = self
                .http()
                .post(url.clone())
                .bearer_auth(current.expose_secret())
                .send()
                .await;

            match result {
                Ok(resp) if resp.status().is_success() => {
                    match self.read_body::<LoginResponse>(resp).await {
                        Ok(body) => {
                            let (token, user) = body.into_parts();
                            self.session().establish(token.clone(), user);
                            debug!(attempt, "token refreshed");
                            return Some(token);
                        }
                        Err(e) => warn!(attempt, error = %e, "unreadable refresh response"),
                    }
                }
                Ok(resp) if resp.status() == StatusCode::NOT_FOUND => {
                    warn!("refresh token no longer exists; clearing session");
                    self.session().clear();
                    return None;
                }
                Ok(resp) => warn!(attempt, status = %resp.status(), "token refresh rejected"),
                Err(e) => {
                    let err = self.transport_error(e);
                    warn!(attempt, error = %err, "token refresh request failed");
                    if !err.is_transient() {
                        break;
                    }
                }
            }

            if attempt < policy.max_attempts && !policy.backoff.is_zero() {
                tokio::time::sleep(policy.backoff * attempt).await;
            }
        }

        warn!(
            max_attempts = policy.max_attempts,
            "token refresh failed; clearing session"
        );
        self.session().clear();
        None
    }

    /// Validate a restored token against the backend.
    ///
    /// Goes through the normal pipeline, so an expired token may be
    /// refreshed on the way. Any failure signs the session out. Returns
    /// whether the session is usable.
    ///
    /// `POST /auth/validate`
    pub async fn rehydrate(&self) -> bool {
        if self.session().token().is_none() {
            return false;
        }

        match self.send_empty(&ApiRequest::post("auth/validate")).await {
            Ok(()) => {
                self.session().mark_validated();
                debug!("restored session validated");
                true
            }
            Err(e) => {
                warn!(error = %e, "restored session rejected");
                if self.session().token().is_some() {
                    self.logout().await;
                }
                false
            }
        }
    }

    /// List the refresh sessions of a user.
    ///
    /// `GET /auth/refresh/:id`
    pub async fn list_refresh_sessions(&self, user_id: &str) -> Result<Vec<RefreshSession>, Error> {
        self.get(&format!("auth/refresh/{user_id}")).await
    }

    /// Revoke one refresh session.
    ///
    /// `DELETE /auth/refresh/:id`
    pub async fn revoke_refresh_session(&self, session_id: &str) -> Result<(), Error> {
        debug!(session_id, "revoking refresh session");
        self.delete(&format!("auth/refresh/{session_id}")).await
    }
}
