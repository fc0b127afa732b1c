use std::{
    path::{Path, PathBuf},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error::ApiError,
    types::{LoginResponse, Role, User},
};

/// Authenticated identity and credentials.
///
/// All fields except the profile are mandatory: a session is either
/// complete or absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access: String,
    pub refresh: String,
    pub user: User,
    pub role: Role,
    #[serde(default)]
    pub profile: Option<serde_json::Value>,
}

impl Session {
    pub fn from_login(login: LoginResponse) -> Self {
        Self {
            role: login.user.role,
            access: login.access,
            refresh: login.refresh,
            user: login.user,
            profile: login.profile,
        }
    }
}

/// Process-wide holder of the current [`Session`].
///
/// Cloning the store clones a handle; every clone sees the same session.
/// The only write paths are [`set_session`](Self::set_session),
/// [`replace_credentials`](Self::replace_credentials) and
/// [`clear`](Self::clear), and each of them keeps the persisted record in
/// step with memory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    current: Arc<RwLock<Option<Session>>>,
    path: Option<Arc<PathBuf>>,
}

impl SessionStore {
    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            path: None,
        }
    }

    /// A store persisted at `path`. Nothing is read until
    /// [`restore`](Self::restore) is called.
    pub fn persisted(path: impl Into<PathBuf>) -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            path: Some(Arc::new(path.into())),
        }
    }

    /// Loads the persisted record, if any. A missing file leaves the store
    /// empty; an unreadable or corrupt one is logged and ignored.
    pub async fn restore(&self) -> Option<Session> {
        let path = self.path.as_deref()?;
        let session = match load_record(path).await {
            Ok(session) => session,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding unreadable session record");
                None
            }
        };
        *self.write() = session.clone();
        session
    }

    /// Installs a new session (login) and persists it.
    pub async fn set_session(&self, session: Session) -> Result<(), ApiError> {
        *self.write() = Some(session.clone());
        self.persist(&session).await?;
        info!(user = %session.user.email, role = %session.role, "session established");
        Ok(())
    }

    /// Replaces the access credential, and the refresh credential when the
    /// server rotated it. Returns `false` without writing anything when no
    /// session is present.
    pub async fn replace_credentials(
        &self,
        access: String,
        refresh: Option<String>,
    ) -> Result<bool, ApiError> {
        let updated = {
            let mut guard = self.write();
            match guard.as_mut() {
                Some(session) => {
                    session.access = access;
                    if let Some(refresh) = refresh {
                        session.refresh = refresh;
                    }
                    Some(session.clone())
                }
                None => None,
            }
        };

        match updated {
            Some(session) => {
                self.persist(&session).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drops the session and deletes the persisted record.
    pub async fn clear(&self) -> Result<(), ApiError> {
        let had_session = self.write().take().is_some();
        if had_session {
            warn!("session cleared");
        }

        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        match async_fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApiError::Storage(e.to_string())),
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.read().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.access.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.refresh.clone())
    }

    pub fn role(&self) -> Option<Role> {
        self.read().as_ref().map(|s| s.role)
    }

    /// Authentication predicate consumed by navigation guards.
    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role() == Some(role)
    }

    async fn persist(&self, session: &Session) -> Result<(), ApiError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| ApiError::Storage(e.to_string()))?;
        }

        let json =
            serde_json::to_string_pretty(session).map_err(|e| ApiError::Storage(e.to_string()))?;
        async_fs::write(path, json)
            .await
            .map_err(|e| ApiError::Storage(e.to_string()))
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn load_record(path: &Path) -> Result<Option<Session>, String> {
    let content = match async_fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.to_string()),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| e.to_string())
}
