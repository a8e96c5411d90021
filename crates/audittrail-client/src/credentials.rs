//! Token persistence and shared authentication state

use crate::error::{ApiError, ClientResult};
use audittrail_model::Identity;
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Map, Value};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Key the token is persisted under
pub const TOKEN_KEY: &str = "token";

/// Route an unauthorized session is sent to
pub const LOGIN_ROUTE: &str = "/login";

/// Durable storage for the bearer token
pub trait TokenStore: Send + Sync + Debug {
    /// Stored token, if any
    fn load(&self) -> ClientResult<Option<String>>;

    /// Replace the stored token
    fn save(&self, token: &str) -> ClientResult<()>;

    /// Remove the stored token
    fn clear(&self) -> ClientResult<()>;
}

/// Token held in memory only
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a token
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> ClientResult<Option<String>> {
        Ok(self.token.lock().clone())
    }

    fn save(&self, token: &str) -> ClientResult<()> {
        *self.token.lock() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        *self.token.lock() = None;
        Ok(())
    }
}

/// Token persisted as `{"token": "..."}` in a JSON file
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store backed by `path`; the file is created on first save
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> ClientResult<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&self.path)?;
        let state: Map<String, Value> =
            serde_json::from_str(&text).map_err(|err| ApiError::Storage(err.to_string()))?;
        Ok(state
            .get(TOKEN_KEY)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string))
    }

    fn save(&self, token: &str) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json!({ TOKEN_KEY: token }).to_string())?;
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Where the session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// Stored token not yet verified
    Loading,
    /// Token verified, identity known
    Authenticated,
    /// No usable token
    Anonymous,
}

/// Broadcast on session changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Login or restore completed
    SignedIn(Identity),
    /// Explicit logout
    SignedOut,
    /// Navigate to a route; sent with [`LOGIN_ROUTE`] when a 401 revokes the session
    Redirect(String),
}

/// Token store, identity and status shared by the client and the session
#[derive(Debug)]
pub struct Credentials {
    store: Arc<dyn TokenStore>,
    identity: RwLock<Option<Identity>>,
    status: RwLock<AuthStatus>,
    events: broadcast::Sender<SessionEvent>,
}

impl Credentials {
    /// Credentials over a token store; status starts at `Loading`
    #[must_use]
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            store,
            identity: RwLock::new(None),
            status: RwLock::new(AuthStatus::Loading),
            events,
        }
    }

    /// Stored token; storage failures read as "no token"
    #[must_use]
    pub fn token(&self) -> Option<String> {
        match self.store.load() {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %err, "failed to read stored token");
                None
            }
        }
    }

    /// Persist a new token
    pub fn set_token(&self, token: &str) -> ClientResult<()> {
        self.store.save(token)
    }

    /// Remove the stored token
    pub fn clear_token(&self) -> ClientResult<()> {
        self.store.clear()
    }

    /// Signed-in user
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.identity.read().clone()
    }

    /// Replace the signed-in user
    pub fn set_identity(&self, identity: Option<Identity>) {
        *self.identity.write() = identity;
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> AuthStatus {
        *self.status.read()
    }

    /// Replace the status
    pub fn set_status(&self, status: AuthStatus) {
        *self.status.write() = status;
    }

    /// Listen for session events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Broadcast an event; having no listeners is fine
    pub fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("session event dropped, no subscribers");
        }
    }

    /// Drop the session after a 401 and redirect to login
    pub fn revoke(&self) {
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to clear stored token");
        }
        self.set_identity(None);
        self.set_status(AuthStatus::Anonymous);
        self.emit(SessionEvent::Redirect(LOGIN_ROUTE.to_string()));
    }
}
