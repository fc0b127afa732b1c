use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    config::Settings, error::ApiError, management::SessionStore, remote::RefreshCoordinator,
};

/// Which pass of a request is being sent.
///
/// Every request starts as `Initial`. A 401 on the initial pass triggers a
/// refresh and one `Replay`; a 401 on the replay is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Initial,
    Replay,
}

impl Attempt {
    /// The attempt that follows a successful refresh, if any remains.
    pub fn after_refresh(self) -> Option<Attempt> {
        match self {
            Attempt::Initial => Some(Attempt::Replay),
            Attempt::Replay => None,
        }
    }
}

/// Description of an outbound call, independent of the credential it will
/// carry.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    authenticated: bool,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into().trim_start_matches('/').to_string(),
            query: Vec::new(),
            body: None,
            authenticated: true,
        }
    }

    pub fn query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query = pairs;
        self
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Marks the request as not needing a credential. A 401 on such a
    /// request is a plain rejection and never triggers a refresh.
    pub fn public(mut self) -> Self {
        self.authenticated = false;
        self
    }
}

/// HTTP client for the roster API.
///
/// Attaches the current access credential to authenticated requests and
/// replays a request once after a successful refresh. Transport failures are
/// returned as [`ApiError::Transport`] and never retried here. The request
/// timeout bounds the whole call, refresh and replay included.
#[derive(Debug)]
pub struct HttpClient {
    http: Client,
    base_url: String,
    timeout: Duration,
    sessions: SessionStore,
    refresher: RefreshCoordinator,
}

impl HttpClient {
    pub fn new(settings: &Settings, sessions: SessionStore) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let base_url = settings.api_url.trim_end_matches('/').to_string();
        let refresher = RefreshCoordinator::new(http.clone(), &base_url, sessions.clone());

        Ok(Self {
            http,
            base_url,
            timeout: settings.request_timeout,
            sessions,
            refresher,
        })
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn refresher(&self) -> &RefreshCoordinator {
        &self.refresher
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<T, ApiError> {
        self.fetch_json(ApiRequest::get(path).query(query)).await
    }

    /// Sends `request` and decodes a JSON body.
    pub async fn fetch_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Sends `request` and returns the successful response.
    ///
    /// Non-success statuses other than a refreshable 401 come back as
    /// [`ApiError::Status`]. Running out of time is a transport failure; a
    /// refresh started on the way keeps running for the next caller.
    pub async fn execute(&self, request: ApiRequest) -> Result<Response, ApiError> {
        let path = request.path.clone();
        match tokio::time::timeout(self.timeout, self.run(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(%path, timeout = ?self.timeout, "request timed out");
                Err(ApiError::Transport(format!(
                    "request to {path} timed out after {:?}",
                    self.timeout
                )))
            }
        }
    }

    async fn run(&self, request: ApiRequest) -> Result<Response, ApiError> {
        let mut attempt = Attempt::Initial;
        let mut credential = if request.authenticated {
            self.sessions.access_token()
        } else {
            None
        };

        loop {
            let response = self.send(&request, credential.as_deref()).await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED && request.authenticated {
                let Some(next) = attempt.after_refresh() else {
                    warn!(path = %request.path, "still unauthorized after refresh");
                    self.sessions.clear().await?;
                    return Err(ApiError::SessionExpired);
                };

                debug!(path = %request.path, "unauthorized, refreshing credential");
                credential = Some(self.refresher.refresh(credential.as_deref()).await?);
                attempt = next;
                continue;
            }

            if !status.is_success() {
                return Err(status_error(response).await);
            }

            return Ok(response);
        }
    }

    async fn send(&self, request: &ApiRequest, credential: Option<&str>) -> Result<Response, ApiError> {
        let url = format!("{}/{}", self.base_url, request.path);
        let mut builder = self.http.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = credential {
            builder = builder.bearer_auth(token);
        }

        builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))
    }
}

/// Turns a non-success response into [`ApiError::Status`], keeping the body
/// as the message.
pub(crate) async fn status_error(response: Response) -> ApiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("unknown status").to_string()
    } else {
        body
    };
    ApiError::Status {
        status: status.as_u16(),
        message,
    }
}
