use reqwest::{Client, StatusCode};
use tracing::{info, warn};

use crate::{
    error::ApiError,
    management::Session,
    remote::{
        HttpClient,
        client::{ApiRequest, status_error},
    },
    types::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse},
};

/// Exchanges email and password for a session and installs it in the
/// client's session store.
///
/// Login is sent without a credential, so a 401 here means "wrong email or
/// password" and comes back as [`ApiError::Status`].
pub async fn login(client: &HttpClient, email: &str, password: &str) -> Result<Session, ApiError> {
    let request = ApiRequest::post("auth/login")
        .public()
        .json(&LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;

    let response: LoginResponse = client.fetch_json(request).await?;
    let session = Session::from_login(response);
    client.sessions().set_session(session.clone()).await?;
    Ok(session)
}

/// Ends the session on the server and locally.
///
/// The local session is cleared even when the server call fails; that
/// failure is logged and returned after the cleanup.
pub async fn logout(client: &HttpClient) -> Result<(), ApiError> {
    if !client.sessions().is_authenticated() {
        return Ok(());
    }

    let remote = client.execute(ApiRequest::post("auth/logout")).await;
    client.sessions().clear().await?;

    match remote {
        Ok(_) | Err(ApiError::SessionExpired) => {
            info!("logged out");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "server-side logout failed, local session cleared anyway");
            Err(e)
        }
    }
}

/// Performs the raw refresh-credential exchange.
///
/// A 400, 401 or 403 means the refresh credential itself is no longer
/// accepted and is reported as [`ApiError::SessionExpired`]. Transport
/// failures (including the client timeout) stay [`ApiError::Transport`].
pub async fn refresh_exchange(
    http: &Client,
    url: &str,
    refresh: &str,
) -> Result<RefreshResponse, ApiError> {
    let response = http
        .post(url)
        .json(&RefreshRequest {
            refresh: refresh.to_string(),
        })
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;

    match response.status() {
        status if status.is_success() => Ok(response.json::<RefreshResponse>().await?),
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(ApiError::SessionExpired)
        }
        _ => Err(status_error(response).await),
    }
}
