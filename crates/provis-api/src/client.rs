// Backend HTTP client
//
// Wraps `reqwest::Client` with bearer-token injection, a single
// refresh-and-replay on 401, and the error/notification policy. Endpoint
// groups (customers, jobs, ...) are inherent methods in sibling modules
// so this one stays focused on transport mechanics.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};
use url::Url;

use crate::auth::RefreshPolicy;
use crate::error::Error;
use crate::notify::{Notifier, TracingNotifier};
use crate::session::SessionContext;
use crate::transport::TransportConfig;

/// A request is replayed at most this many times after a token refresh.
const MAX_AUTH_REPLAYS: u8 = 1;

/// Error payload shape. Only `errorCode` marks an error as structured.
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

// ── Request description ──────────────────────────────────────────────

/// Request body. Multipart bodies keep their bytes so the request can be
/// rebuilt for a replay.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart {
        field: String,
        file_name: String,
        mime: String,
        bytes: Vec<u8>,
    },
}

/// A replayable description of one backend call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base, without a leading slash.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, body: &impl Serialize) -> Result<Self, Error> {
        let value = serde_json::to_value(body).map_err(|e| Error::Deserialization {
            message: format!("failed to encode request body: {e}"),
            body: String::new(),
        })?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn multipart(
        mut self,
        field: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.body = RequestBody::Multipart {
            field: field.into(),
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        };
        self
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Authenticated client for the provisioning backend.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<SessionContext>,
    notifier: Arc<dyn Notifier>,
    refresh_policy: RefreshPolicy,
    /// Request timeout the `http` client was built with.
    timeout: Duration,
}

impl ApiClient {
    /// Build a client from a base URL, shared session, and transport config.
    pub fn new(
        base_url: &str,
        session: Arc<SessionContext>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, session)?.with_timeout(transport.timeout))
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        session: Arc<SessionContext>,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            session,
            notifier: Arc::new(TracingNotifier),
            refresh_policy: RefreshPolicy::default(),
            timeout: TransportConfig::default().timeout,
        })
    }

    /// Route notifications to `notifier` instead of `tracing`.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.refresh_policy = policy;
        self
    }

    /// Record the timeout of a client passed to
    /// [`with_client`](Self::with_client), for error reporting.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Ensure the base path ends with `/` so relative joins append.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn refresh_policy(&self) -> &RefreshPolicy {
        &self.refresh_policy
    }

    pub(crate) fn transport_error(&self, err: reqwest::Error) -> Error {
        Error::from_transport(err, self.timeout)
    }

    // ── URL builder ──────────────────────────────────────────────────

    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    // ── Pipeline ─────────────────────────────────────────────────────

    /// Send `request` through the full pipeline and return the successful
    /// response. Non-2xx responses are classified into [`Error`].
    pub async fn execute(&self, request: &ApiRequest) -> Result<reqwest::Response, Error> {
        let mut replays: u8 = 0;

        loop {
            self.session.reconcile();

            let resp = match self.send_once(request).await {
                Ok(resp) => resp,
                Err(e) => {
                    warn!(path = %request.path, error = %e, "request failed");
                    self.notifier.generic_error();
                    return Err(e);
                }
            };

            let status = resp.status();
            if status.is_success() {
                return Ok(resp);
            }

            if status == StatusCode::UNAUTHORIZED {
                if replays >= MAX_AUTH_REPLAYS {
                    debug!(path = %request.path, "401 after token refresh; giving up");
                    return Err(Error::Authentication {
                        message: "request rejected after token refresh".into(),
                    });
                }
                replays += 1;

                debug!(path = %request.path, "401 received; refreshing token");
                // A failed refresh clears the session, so keep the token
                // for the server-side logout.
                let rejected = self.session.token();
                if self.refresh_access_token().await.is_some() {
                    continue;
                }
                self.end_session(rejected).await;
                return Err(Error::SessionExpired);
            }

            return Err(self.classify_failure(status, resp).await);
        }
    }

    async fn send_once(&self, request: &ApiRequest) -> Result<reqwest::Response, Error> {
        let url = self.url(&request.path)?;
        debug!("{} {url}", request.method);

        let mut builder = self.http.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token.expose_secret());
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart {
                field,
                file_name,
                mime,
                bytes,
            } => {
                let part = reqwest::multipart::Part::bytes(bytes.clone())
                    .file_name(file_name.clone())
                    .mime_str(mime)?;
                builder.multipart(reqwest::multipart::Form::new().part(field.clone(), part))
            }
        };

        builder.send().await.map_err(|e| self.transport_error(e))
    }

    /// Turn a non-2xx, non-401 response into an error, raising the generic
    /// notification unless the body carries an application error code.
    async fn classify_failure(&self, status: StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<ErrorResponse>(&raw).ok();

        let message = parsed
            .as_ref()
            .and_then(|p| p.message.clone().or_else(|| p.error.clone()))
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw.chars().take(200).collect()
                }
            });
        let code = parsed
            .and_then(|p| p.error_code)
            .filter(|c| !c.trim().is_empty());

        if status.is_server_error() {
            warn!(%status, %message, "server error");
            self.notifier.generic_error();
            return Error::Server {
                status: status.as_u16(),
                message,
            };
        }

        if code.is_none() {
            self.notifier.generic_error();
        } else {
            trace!(%status, ?code, "structured error left to caller");
        }

        Error::Api {
            status: status.as_u16(),
            code,
            message,
        }
    }

    // ── Typed helpers ────────────────────────────────────────────────

    /// Execute and decode a JSON response body.
    ///
    /// A body that cannot be read raises the generic notification; one
    /// that cannot be decoded does not.
    pub async fn send_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, Error> {
        let resp = self.execute(request).await?;
        self.read_body(resp).await.inspect_err(|e| {
            if matches!(e, Error::Transport(_) | Error::Timeout { .. }) {
                warn!(path = %request.path, error = %e, "response body unreadable");
                self.notifier.generic_error();
            }
        })
    }

    /// Read and decode a successful response body, keeping a preview on
    /// decode failure.
    pub(crate) async fn read_body<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    /// Execute and discard the response body.
    pub async fn send_empty(&self, request: &ApiRequest) -> Result<(), Error> {
        self.execute(request).await.map(drop)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.send_json(&ApiRequest::get(path)).await
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        self.send_json(&ApiRequest::post(path).json(body)?).await
    }

    pub(crate) async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        self.send_json(&ApiRequest::patch(path).json(body)?).await
    }

    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        self.send_json(&ApiRequest::put(path).json(body)?).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), Error> {
        self.send_empty(&ApiRequest::delete(path)).await
    }
}
