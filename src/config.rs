//! Runtime configuration for the planner binaries.
//!
//! Everything is read from environment variables; [`PlannerConfig::from_lookup`]
//! takes any key lookup so tests never touch the process environment.

use crate::persistence::{JsonDocumentStore, ScheduleStore};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

pub const HTTP_ADDR_VAR: &str = "STUDY_PLANNER_HTTP_ADDR";
pub const DATA_PATH_VAR: &str = "STUDY_PLANNER_DATA_PATH";
pub const STORE_VAR: &str = "STUDY_PLANNER_STORE";

const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_DATA_PATH: &str = "study_planner.json";

/// Backing store used by the binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Json,
    Sqlite,
}

impl StoreBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreBackend::Json => "json",
            StoreBackend::Sqlite => "sqlite",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(StoreBackend::Json),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => Err(ConfigError::UnknownStore(other.to_string())),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidAddr { value: String, reason: String },
    UnknownStore(String),
    StoreUnavailable(StoreBackend),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidAddr { value, reason } => {
                write!(f, "{HTTP_ADDR_VAR}='{value}' is not a socket address: {reason}")
            }
            ConfigError::UnknownStore(value) => {
                write!(f, "{STORE_VAR}='{value}' must be 'json' or 'sqlite'")
            }
            ConfigError::StoreUnavailable(backend) => {
                write!(f, "store '{backend}' is not compiled into this build")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    pub http_addr: SocketAddr,
    pub data_path: PathBuf,
    pub backend: StoreBackend,
}

impl PlannerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let addr = non_empty(HTTP_ADDR_VAR).unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let http_addr = addr
            .trim()
            .parse::<SocketAddr>()
            .map_err(|err| ConfigError::InvalidAddr {
                value: addr.clone(),
                reason: err.to_string(),
            })?;

        let data_path = non_empty(DATA_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        let backend = match non_empty(STORE_VAR) {
            Some(value) => value.parse()?,
            None => StoreBackend::default(),
        };

        Ok(Self {
            http_addr,
            data_path,
            backend,
        })
    }

    /// Open the configured store at `data_path`.
    pub fn open_store(&self) -> Result<Box<dyn ScheduleStore + Send + Sync>, OpenStoreError> {
        match self.backend {
            StoreBackend::Json => Ok(Box::new(JsonDocumentStore::new(self.data_path.clone()))),
            #[cfg(feature = "sqlite")]
            StoreBackend::Sqlite => {
                let store = crate::persistence::sqlite::SqliteScheduleStore::new(&self.data_path)?;
                Ok(Box::new(store))
            }
            #[cfg(not(feature = "sqlite"))]
            StoreBackend::Sqlite => Err(ConfigError::StoreUnavailable(StoreBackend::Sqlite).into()),
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            backend: StoreBackend::Json,
        }
    }
}

#[derive(Debug)]
pub enum OpenStoreError {
    Config(ConfigError),
    Persistence(crate::persistence::PersistenceError),
}

impl fmt::Display for OpenStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenStoreError::Config(err) => write!(f, "{err}"),
            OpenStoreError::Persistence(err) => write!(f, "failed to open store: {err}"),
        }
    }
}

impl std::error::Error for OpenStoreError {}

impl From<ConfigError> for OpenStoreError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<crate::persistence::PersistenceError> for OpenStoreError {
    fn from(value: crate::persistence::PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = PlannerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, PlannerConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = PlannerConfig::from_lookup(lookup(&[
            (HTTP_ADDR_VAR, "0.0.0.0:8080"),
            (DATA_PATH_VAR, "/tmp/plan.db"),
            (STORE_VAR, "SQLite"),
        ]))
        .unwrap();
        assert_eq!(config.http_addr.port(), 8080);
        assert_eq!(config.data_path, PathBuf::from("/tmp/plan.db"));
        assert_eq!(config.backend, StoreBackend::Sqlite);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = PlannerConfig::from_lookup(lookup(&[(STORE_VAR, "  ")])).unwrap();
        assert_eq!(config.backend, StoreBackend::Json);
    }

    #[test]
    fn rejects_bad_values() {
        let err = PlannerConfig::from_lookup(lookup(&[(HTTP_ADDR_VAR, "nowhere")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddr { .. }));

        let err = PlannerConfig::from_lookup(lookup(&[(STORE_VAR, "postgres")])).unwrap_err();
        assert_eq!(err, ConfigError::UnknownStore("postgres".into()));
    }
}
