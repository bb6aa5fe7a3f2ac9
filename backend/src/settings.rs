//! Service configuration loaded via OrthoConfig.
//!
//! Values come from CLI flags, `USER_SERVICE_*` environment variables, or a
//! configuration file, in that order of precedence.

use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{CollectionStrategy, UnknownCollectionStrategy};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_AUDITOR: &str = "system";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {message}")]
    BindAddr { value: String, message: String },
    #[error(transparent)]
    CollectionStrategy(#[from] UnknownCollectionStrategy),
}

/// Runtime settings for the user service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "USER_SERVICE")]
pub struct ServiceSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; the in-memory adapters are used when unset.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
    /// `merge`, `replace`, or `ignore` for nested user collections.
    pub collection_strategy: Option<String>,
    /// Actor recorded in audit blocks.
    pub auditor: Option<String>,
    /// Create the sample users when the store is empty.
    pub seed_sample_data: Option<bool>,
    /// Cache scalar entity lookups per service.
    pub entity_cache: Option<bool>,
}

impl ServiceSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS)
    }

    pub fn collection_strategy(&self) -> Result<CollectionStrategy, SettingsError> {
        self.collection_strategy
            .as_deref()
            .map_or(Ok(CollectionStrategy::default()), str::parse)
            .map_err(SettingsError::from)
    }

    pub fn auditor(&self) -> &str {
        self.auditor.as_deref().unwrap_or(DEFAULT_AUDITOR)
    }

    /// Off unless explicitly enabled.
    pub fn seed_sample_data(&self) -> bool {
        self.seed_sample_data.unwrap_or(false)
    }

    /// On unless explicitly disabled.
    pub fn entity_cache(&self) -> bool {
        self.entity_cache.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for service configuration parsing.

    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    use super::*;

    const VARS: [&str; 7] = [
        "USER_SERVICE_BIND_ADDR",
        "USER_SERVICE_DATABASE_URL",
        "USER_SERVICE_DB_MAX_CONNECTIONS",
        "USER_SERVICE_COLLECTION_STRATEGY",
        "USER_SERVICE_AUDITOR",
        "USER_SERVICE_SEED_SAMPLE_DATA",
        "USER_SERVICE_ENTITY_CACHE",
    ];

    fn load_from_empty_args() -> ServiceSettings {
        ServiceSettings::load_from_iter([OsString::from("user-service")])
            .expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();

        assert_eq!(settings.bind_addr(), Ok(SocketAddr::from(([0, 0, 0, 0], 8080))));
        assert!(settings.database_url.is_none());
        assert_eq!(settings.db_max_connections(), 10);
        assert_eq!(settings.collection_strategy(), Ok(CollectionStrategy::Merge));
        assert_eq!(settings.auditor(), "system");
        assert!(!settings.seed_sample_data());
        assert!(settings.entity_cache());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("USER_SERVICE_BIND_ADDR", Some("127.0.0.1:9090".to_owned())),
            (
                "USER_SERVICE_DATABASE_URL",
                Some("postgres://localhost/users".to_owned()),
            ),
            ("USER_SERVICE_DB_MAX_CONNECTIONS", Some("4".to_owned())),
            ("USER_SERVICE_COLLECTION_STRATEGY", Some("replace".to_owned())),
            ("USER_SERVICE_AUDITOR", Some("importer".to_owned())),
            ("USER_SERVICE_SEED_SAMPLE_DATA", Some("true".to_owned())),
            ("USER_SERVICE_ENTITY_CACHE", Some("false".to_owned())),
        ]);

        let settings = load_from_empty_args();

        assert_eq!(settings.bind_addr(), Ok(SocketAddr::from(([127, 0, 0, 1], 9090))));
        assert_eq!(settings.database_url.as_deref(), Some("postgres://localhost/users"));
        assert_eq!(settings.db_max_connections(), 4);
        assert_eq!(settings.collection_strategy(), Ok(CollectionStrategy::Replace));
        assert_eq!(settings.auditor(), "importer");
        assert!(settings.seed_sample_data());
        assert!(!settings.entity_cache());
    }

    #[rstest]
    #[case("true", true)]
    #[case("false", false)]
    fn entity_cache_toggle_is_read_alone(#[case] raw: &str, #[case] expected: bool) {
        let _guard = lock_env(VARS.map(|name| {
            let value = (name == "USER_SERVICE_ENTITY_CACHE").then(|| raw.to_owned());
            (name, value)
        }));

        let settings = load_from_empty_args();

        assert_eq!(settings.entity_cache(), expected);
        assert!(!settings.seed_sample_data());
    }

    #[rstest]
    fn unknown_strategy_is_rejected() {
        let _guard = lock_env(VARS.map(|name| {
            let value =
                (name == "USER_SERVICE_COLLECTION_STRATEGY").then(|| "sometimes".to_owned());
            (name, value)
        }));

        let settings = load_from_empty_args();

        assert!(matches!(
            settings.collection_strategy(),
            Err(SettingsError::CollectionStrategy(_))
        ));
    }
}
