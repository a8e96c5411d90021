//! Authentication session: initialize, login, logout
//!
//! The session owns no state of its own; it drives the shared
//! [`Credentials`] that the [`ApiClient`] reads its bearer token from.

use crate::api::ApiClient;
use crate::cache::QueryCache;
use crate::credentials::{AuthStatus, Credentials, SessionEvent, LOGIN_ROUTE};
use crate::error::ClientResult;
use crate::keys::QueryKey;
use audittrail_model::{Identity, TokenResponse};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a protected route should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Render the route
    Allow,
    /// Session still being restored; render a placeholder
    Loading,
    /// Send the user to the given route
    Redirect(String),
}

/// Login / logout / restore sequence over shared credentials
#[derive(Debug, Clone)]
pub struct Session {
    client: ApiClient,
    cache: QueryCache,
}

impl Session {
    /// Session driving `client`'s credentials
    #[must_use]
    pub fn new(client: ApiClient, cache: QueryCache) -> Self {
        Self { client, cache }
    }

    fn credentials(&self) -> &Arc<Credentials> {
        self.client.credentials()
    }

    /// Restore a persisted session
    ///
    /// Without a stored token the session becomes anonymous immediately.
    /// With one, the identity endpoint is asked who it belongs to; any
    /// failure discards the token.
    pub async fn initialize(&self) -> Option<Identity> {
        let credentials = self.credentials();
        if credentials.token().is_none() {
            credentials.set_status(AuthStatus::Anonymous);
            debug!("no stored token");
            return None;
        }

        credentials.set_status(AuthStatus::Loading);
        match self.client.get::<Identity>("/api/auth/me").await {
            Ok(identity) => {
                info!(user = %identity.username, "session restored");
                self.sign_in(identity.clone());
                Some(identity)
            }
            Err(err) => {
                warn!(error = %err, "stored token rejected");
                self.reset();
                None
            }
        }
    }

    /// Exchange credentials for a token and load the identity
    ///
    /// # Errors
    ///
    /// Rejected credentials or an unreachable server. A failed identity
    /// lookup after a successful login leaves the session anonymous.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<Identity> {
        let fields = vec![
            ("username".to_string(), username.to_string()),
            ("password".to_string(), password.to_string()),
        ];
        let token: TokenResponse = self.client.post_form("/api/auth/login", fields).await?;
        self.credentials().set_token(&token.access_token)?;

        match self.client.get::<Identity>("/api/auth/me").await {
            Ok(identity) => {
                info!(user = %identity.username, "signed in");
                self.sign_in(identity.clone());
                Ok(identity)
            }
            Err(err) => {
                self.reset();
                Err(err)
            }
        }
    }

    /// Drop the token, identity and every cached response
    pub fn logout(&self) {
        self.reset();
        self.cache.clear();
        self.credentials().emit(SessionEvent::SignedOut);
        info!("signed out");
    }

    /// Signed-in user
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.credentials().identity()
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> AuthStatus {
        self.credentials().status()
    }

    /// Whether a verified identity is present
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status() == AuthStatus::Authenticated
    }

    /// Gate for routes that need a signed-in user
    #[must_use]
    pub fn guard(&self) -> RouteDecision {
        match self.status() {
            AuthStatus::Authenticated => RouteDecision::Allow,
            AuthStatus::Loading => RouteDecision::Loading,
            AuthStatus::Anonymous => RouteDecision::Redirect(LOGIN_ROUTE.to_string()),
        }
    }

    fn sign_in(&self, identity: Identity) {
        let credentials = self.credentials();
        credentials.set_identity(Some(identity.clone()));
        credentials.set_status(AuthStatus::Authenticated);
        self.cache.invalidate(&QueryKey::me());
        credentials.emit(SessionEvent::SignedIn(identity));
    }

    fn reset(&self) {
        let credentials = self.credentials();
        if let Err(err) = credentials.clear_token() {
            warn!(error = %err, "failed to clear stored token");
        }
        credentials.set_identity(None);
        credentials.set_status(AuthStatus::Anonymous);
    }
}
