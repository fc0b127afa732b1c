use std::sync::{Arc, Mutex, MutexGuard};

use reqwest::Client;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{error::ApiError, management::SessionStore, remote::auth};

type Outcome = Option<Result<String, ApiError>>;
type PendingRefresh = watch::Receiver<Outcome>;

/// Serializes refresh-credential exchanges.
///
/// The first caller that needs a new access credential spawns the exchange
/// on its own task and parks a receiver for its outcome in `pending`. Every
/// caller arriving before it settles subscribes to the same receiver and
/// gets the same outcome. The exchange does not belong to any caller, so a
/// caller that is cancelled while waiting never cancels the exchange. The
/// slot is emptied once the outcome is published, so the next expiry starts
/// a fresh exchange.
#[derive(Debug)]
pub struct RefreshCoordinator {
    http: Client,
    refresh_url: String,
    sessions: SessionStore,
    pending: Arc<Mutex<Option<PendingRefresh>>>,
}

impl RefreshCoordinator {
    pub fn new(http: Client, base_url: &str, sessions: SessionStore) -> Self {
        Self {
            http,
            refresh_url: format!("{base_url}/auth/refresh"),
            sessions,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns an access credential newer than `rejected`, the one the
    /// server just refused.
    ///
    /// If the session already holds a different credential (another request
    /// finished a refresh in the meantime) it is returned without a new
    /// exchange.
    pub async fn refresh(&self, rejected: Option<&str>) -> Result<String, ApiError> {
        if let Some(current) = self.sessions.access_token() {
            if rejected != Some(current.as_str()) {
                debug!("access credential already replaced, reusing it");
                return Ok(current);
            }
        }

        let mut outcome = {
            let mut slot = lock(&self.pending);
            match slot.as_ref() {
                Some(pending) => {
                    debug!("joining in-flight refresh");
                    pending.clone()
                }
                None => {
                    let pending = self.start_exchange();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        let settled = outcome
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|settled| settled.clone());
        // the sender only goes away without an outcome if the runtime is
        // shutting down
        settled.unwrap_or_else(|| {
            Err(ApiError::Transport(
                "refresh exchange was aborted".to_string(),
            ))
        })
    }

    /// Whether an exchange is currently pending.
    pub fn is_refreshing(&self) -> bool {
        lock(&self.pending).is_some()
    }

    fn start_exchange(&self) -> PendingRefresh {
        let (publish, pending) = watch::channel(None);
        let http = self.http.clone();
        let url = self.refresh_url.clone();
        let sessions = self.sessions.clone();
        let slot = Arc::clone(&self.pending);

        tokio::spawn(async move {
            let result = exchange(&http, &url, &sessions).await;
            // only this exchange can occupy the slot until it is emptied here
            *lock(&slot) = None;
            publish.send_replace(Some(result));
        });
        pending
    }
}

async fn exchange(http: &Client, url: &str, sessions: &SessionStore) -> Result<String, ApiError> {
    let Some(refresh) = sessions.refresh_token() else {
        warn!("no refresh credential available");
        sessions.clear().await?;
        return Err(ApiError::SessionExpired);
    };

    match auth::refresh_exchange(http, url, &refresh).await {
        Ok(grant) => {
            let access = grant.access.clone();
            if !sessions
                .replace_credentials(grant.access, grant.refresh)
                .await?
            {
                // logged out while the exchange was in flight
                return Err(ApiError::SessionExpired);
            }
            info!("access credential refreshed");
            Ok(access)
        }
        Err(ApiError::SessionExpired) => {
            warn!("refresh credential rejected");
            sessions.clear().await?;
            Err(ApiError::SessionExpired)
        }
        Err(e) => Err(e),
    }
}

fn lock(slot: &Mutex<Option<PendingRefresh>>) -> MutexGuard<'_, Option<PendingRefresh>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
