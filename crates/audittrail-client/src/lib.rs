//! AuditTrail Client
//!
//! Async client for the AuditTrail case-management API:
//! - [`QueryCache`]: key-addressed response cache with per-resource
//!   freshness, single-flight reads and prefix invalidation
//! - [`OptimisticUpdate`]: snapshot, apply, then commit or restore
//! - [`TimelineController`]: grace-period delete with undo
//! - [`Session`]: token persistence, identity, route guard
//! - Typed endpoint groups in [`resources`]
//!
//! Every request goes through a [`Transport`]; [`HttpTransport`] is the
//! reqwest implementation, tests script their own.
//!
//! # Example
//!
//! ```rust,no_run
//! use audittrail_client::{AuditTrail, ClientConfig};
//! use audittrail_model::CaseFilters;
//!
//! # async fn run() -> audittrail_client::ClientResult<()> {
//! let app = AuditTrail::from_config(&ClientConfig::default())?;
//! app.session().login("alice", "secret").await?;
//! let page = app.cases().list(&CaseFilters::default()).await?;
//! println!("{} cases", page.total);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod api;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod keys;
pub mod logging;
pub mod mutation;
pub mod optimistic;
pub mod resources;
pub mod session;
pub mod timeline;
pub mod transport;

pub use api::{filename_from_disposition, ApiClient, Download};
pub use cache::{CacheSettings, CacheStats, QueryCache};
pub use config::{ClientConfig, ConfigError};
pub use credentials::{
    AuthStatus, Credentials, FileTokenStore, MemoryTokenStore, SessionEvent, TokenStore, LOGIN_ROUTE,
};
pub use error::{ApiError, ClientResult};
pub use http::HttpTransport;
pub use keys::QueryKey;
pub use mutation::Mutation;
pub use optimistic::{run_optimistic, MutationPhase, OptimisticUpdate};
pub use resources::{BatchesApi, CasesApi, DirectoryApi, EventsApi, ImportsApi, JiraApi, ReportsApi};
pub use session::{RouteDecision, Session};
pub use timeline::{TimelineController, DEFAULT_UNDO_GRACE};
pub use transport::{ApiRequest, ApiResponse, HttpMethod, RequestBody, Transport};

use audittrail_model::CaseId;
use std::sync::Arc;
use std::time::Duration;

/// One client context: transport, credentials, cache and session
///
/// Clones share everything.
#[derive(Debug, Clone)]
pub struct AuditTrail {
    client: ApiClient,
    cache: QueryCache,
    session: Session,
    undo_grace: Duration,
}

impl AuditTrail {
    /// Build from configuration with the reqwest transport
    ///
    /// # Errors
    /// Invalid configuration or base URL.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config.base_url, config.timeout())?;
        let store: Arc<dyn TokenStore> = match &config.token_file {
            Some(path) => Arc::new(FileTokenStore::new(path)),
            None => Arc::new(MemoryTokenStore::new()),
        };
        Ok(Self::with_transport(
            Arc::new(transport),
            store,
            QueryCache::new(config.cache_settings()),
            config.undo_grace(),
        ))
    }

    /// Build over any transport and token store
    #[must_use]
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        store: Arc<dyn TokenStore>,
        cache: QueryCache,
        undo_grace: Duration,
    ) -> Self {
        let credentials = Arc::new(Credentials::new(store));
        let client = ApiClient::new(transport, credentials);
        let session = Session::new(client.clone(), cache.clone());
        Self {
            client,
            cache,
            session,
            undo_grace,
        }
    }

    /// Raw API client
    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Shared cache
    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Session context
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Cases
    #[must_use]
    pub fn cases(&self) -> CasesApi {
        CasesApi::new(self.client.clone(), self.cache.clone())
    }

    /// Timeline events
    #[must_use]
    pub fn events(&self) -> EventsApi {
        EventsApi::new(self.client.clone(), self.cache.clone())
    }

    /// File batches
    #[must_use]
    pub fn batches(&self) -> BatchesApi {
        BatchesApi::new(self.client.clone(), self.cache.clone())
    }

    /// Users, audit types, identity
    #[must_use]
    pub fn directory(&self) -> DirectoryApi {
        DirectoryApi::new(self.client.clone(), self.cache.clone())
    }

    /// Issue-tracker scraping and field mappings
    #[must_use]
    pub fn jira(&self) -> JiraApi {
        JiraApi::new(self.client.clone(), self.cache.clone())
    }

    /// Spreadsheet import
    #[must_use]
    pub fn imports(&self) -> ImportsApi {
        ImportsApi::new(self.client.clone(), self.cache.clone())
    }

    /// Report downloads
    #[must_use]
    pub fn reports(&self) -> ReportsApi {
        ReportsApi::new(self.client.clone())
    }

    /// Timeline of one case with the configured undo window
    #[must_use]
    pub fn timeline(&self, case_id: CaseId) -> TimelineController {
        TimelineController::with_grace(self.client.clone(), self.cache.clone(), case_id, self.undo_grace)
    }
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
