//! Configuration loading and representation.
//!
//! Everything comes from the environment and is read once at startup.

use std::time::Duration;

use thiserror::Error;

use crate::catalog::{ParsePolicyError, TreePolicy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}: {source}")]
    Policy {
        var: &'static str,
        #[source]
        source: ParsePolicyError,
    },

    #[error("{var} must be {expected} (got {value:?})")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")]
    MissingDatabaseUrl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresSettings {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    Postgres(PostgresSettings),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub store: StoreBackend,
    pub policy: TreePolicy,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            store: StoreBackend::InMemory,
            policy: TreePolicy::default(),
        }
    }
}

impl CatalogConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut policy = TreePolicy::default();
        if let Some(v) = policy_var(&lookup, "STOCKROOM_CHILDREN_DEPTH")? {
            policy.children_depth = v;
        }
        if let Some(v) = policy_var(&lookup, "STOCKROOM_CYCLES")? {
            policy.cycles = v;
        }
        if let Some(v) = policy_var(&lookup, "STOCKROOM_EMPTY_SEARCH")? {
            policy.empty_search = v;
        }

        let persistent = match lookup("USE_PERSISTENT_STORES") {
            None => false,
            Some(v) => v.trim().parse::<bool>().map_err(|_| ConfigError::Invalid {
                var: "USE_PERSISTENT_STORES",
                expected: "true or false",
                value: v,
            })?,
        };

        let store = if persistent {
            let database_url = lookup("DATABASE_URL")
                .filter(|url| !url.trim().is_empty())
                .ok_or(ConfigError::MissingDatabaseUrl)?;
            StoreBackend::Postgres(PostgresSettings {
                database_url,
                max_connections: number_var(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
                acquire_timeout: Duration::from_secs(number_var(
                    &lookup,
                    "DATABASE_ACQUIRE_TIMEOUT_SECS",
                    5,
                )?),
            })
        } else {
            StoreBackend::InMemory
        };

        Ok(Self { store, policy })
    }
}

fn policy_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr<Err = ParsePolicyError>,
{
    lookup(var)
        .map(|v| v.parse::<T>().map_err(|source| ConfigError::Policy { var, source }))
        .transpose()
}

fn number_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let Some(value) = lookup(var) else {
        return Ok(default);
    };
    match value.trim().parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(ConfigError::Invalid {
            var,
            expected: "a positive integer",
            value,
        }),
    }
}
