use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Proof of authenticated identity issued by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub user: AuthUser,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }

    /// Token suitable for a bearer header, if the session still carries one.
    pub fn bearer_token(&self) -> Option<&str> {
        let token = self.access_token.trim();
        (!token.is_empty()).then_some(token)
    }
}

/// Read access to whatever currently holds the user's session.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_session(&self) -> Option<Session>;
}

/// Shared session slot, optionally mirrored to a JSON file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Session>>>,
    path: Option<PathBuf>,
}

impl SessionStore {
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
            path: None,
        }
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(session))),
            path: None,
        }
    }

    /// Load the persisted session, falling back to the `.tmp` copy when the main file is corrupted.
    pub async fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let session = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Option<Session>>(&bytes) {
                Ok(session) => session,
                Err(e) => {
                    warn!(error = %e, path = %path.display(), "failed to parse session, trying tmp fallback");
                    let tmp = path.with_extension("json.tmp");
                    match tokio::fs::read(&tmp).await {
                        Ok(tmp_bytes) => serde_json::from_slice(&tmp_bytes).unwrap_or_default(),
                        Err(_) => None,
                    }
                }
            },
            Err(_) => None,
        };
        Self {
            inner: Arc::new(RwLock::new(session)),
            path: Some(path),
        }
    }

    pub async fn get(&self) -> Option<Session> {
        self.inner.read().await.clone()
    }

    pub async fn set(&self, session: Session) {
        *self.inner.write().await = Some(session);
        self.persist().await;
    }

    pub async fn clear(&self) {
        *self.inner.write().await = None;
        self.persist().await;
    }

    async fn persist(&self) {
        let Some(path) = &self.path else {
            debug!("session store is in-memory only; skipping persist");
            return;
        };
        let inner = self.inner.read().await;
        match serde_json::to_vec_pretty(&*inner) {
            Ok(bytes) => {
                if let Some(parent) = path.parent() {
                    if let Err(e) = tokio::fs::create_dir_all(parent).await {
                        warn!(error = %e, path = %parent.display(), "failed to create session directory");
                    }
                }
                let tmp = path.with_extension("json.tmp");
                if let Err(e) = write_private(&tmp, &bytes).await {
                    warn!(error = %e, path = %tmp.display(), "failed to write temp session file");
                    return;
                }
                if let Err(e) = tokio::fs::rename(&tmp, path).await {
                    warn!(error = %e, path = %path.display(), "failed to persist session");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize session"),
        }
    }
}

/// Tokens are credentials: the file is readable by its owner only.
async fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);
    let mut file = options.open(path).await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // `mode` only applies on creation; a leftover temp file keeps its old bits.
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .await?;
    }
    file.write_all(bytes).await?;
    file.sync_all().await
}

#[async_trait]
impl SessionProvider for SessionStore {
    async fn current_session(&self) -> Option<Session> {
        self.get().await
    }
}
