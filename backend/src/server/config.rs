//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use user_service::domain::CollectionStrategy;
use user_service::outbound::persistence::DbPool;
use user_service::settings::{ServiceSettings, SettingsError};

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) collection_strategy: CollectionStrategy,
    pub(crate) auditor: String,
    pub(crate) entity_cache: bool,
}

impl ServerConfig {
    /// Construct a server configuration bound to `bind_addr` with default
    /// service behaviour.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            db_pool: None,
            collection_strategy: CollectionStrategy::default(),
            auditor: user_service::domain::crud_service::DEFAULT_AUDITOR.to_owned(),
            entity_cache: true,
        }
    }

    /// Derive the configuration from loaded settings.
    ///
    /// # Errors
    /// Returns [`SettingsError`] when the bind address or collection strategy
    /// cannot be parsed.
    pub fn from_settings(settings: &ServiceSettings) -> Result<Self, SettingsError> {
        Ok(Self::new(settings.bind_addr()?)
            .with_collection_strategy(settings.collection_strategy()?)
            .with_auditor(settings.auditor())
            .with_entity_cache(settings.entity_cache()))
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// Without one the server keeps its data in memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[must_use]
    pub fn with_collection_strategy(mut self, strategy: CollectionStrategy) -> Self {
        self.collection_strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_auditor(mut self, auditor: impl Into<String>) -> Self {
        self.auditor = auditor.into();
        self
    }

    #[must_use]
    pub fn with_entity_cache(mut self, enabled: bool) -> Self {
        self.entity_cache = enabled;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
