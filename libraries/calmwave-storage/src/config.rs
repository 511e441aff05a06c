//! Storage configuration

use calmwave_core::{CatalogError, Result, Secret};
use serde::Deserialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Where the catalog lives and how connections to it behave.
///
/// `host`, `port`, `schema`, `username` and `credential` are the coordinates of the legacy
/// server deployment. Their defaults are the values that deployment shipped with and exist
/// for compatibility testing only. The bundled driver is SQLite, which only reads
/// `database_url`, so `validate` rejects coordinates that differ from those defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_schema")]
    pub schema: String,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default)]
    pub credential: Secret,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,

    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,

    /// Upper bound for a single statement; unbounded when absent
    #[serde(default)]
    pub statement_timeout_ms: Option<u64>,

    /// bcrypt work factor for stored credentials
    #[serde(default = "default_credential_cost")]
    pub credential_cost: u32,
}

impl StorageConfig {
    /// Load configuration from an optional TOML file, then `CALMWAVE_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(CatalogError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            settings = settings.add_source(config::File::from(path));
        }

        // Override with environment variables (prefixed with CALMWAVE_)
        settings = settings.add_source(config::Environment::with_prefix("CALMWAVE").try_parsing(true));

        let config = settings
            .build()
            .map_err(|e| CatalogError::Config(e.to_string()))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| CatalogError::Config(e.to_string()))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(CatalogError::Config("database_url is required".to_string()));
        }

        if self.max_connections == 0 {
            return Err(CatalogError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }

        let overridden = self.overridden_coordinates();
        if !overridden.is_empty() {
            return Err(CatalogError::Config(format!(
                "{} not supported by the sqlite driver; set database_url instead",
                overridden.join(", ")
            )));
        }

        if !(4..=31).contains(&self.credential_cost) {
            return Err(CatalogError::Config(format!(
                "credential_cost {} is outside bcrypt's 4..=31",
                self.credential_cost
            )));
        }

        Ok(())
    }

    /// Server coordinates set to something other than the legacy defaults
    fn overridden_coordinates(&self) -> Vec<&'static str> {
        let mut overridden = Vec::new();
        if self.host != default_host() {
            overridden.push("host");
        }
        if self.port != default_port() {
            overridden.push("port");
        }
        if self.schema != default_schema() {
            overridden.push("schema");
        }
        if self.username != default_username() {
            overridden.push("username");
        }
        if !self.credential.is_empty() {
            overridden.push("credential");
        }
        overridden
    }

    /// Coordinates for logs, e.g. `root:***@127.0.0.1:3306/calmwave`
    pub fn connection_label(&self) -> String {
        let credential = if self.credential.is_empty() { "" } else { ":***" };
        format!(
            "{}{}@{}:{}/{}",
            self.username, credential, self.host, self.port, self.schema
        )
    }

    pub fn statement_timeout(&self) -> Option<Duration> {
        self.statement_timeout_ms.map(Duration::from_millis)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// SQLite options derived from `database_url`
    pub fn connect_options(&self) -> Result<SqliteConnectOptions> {
        let options = SqliteConnectOptions::from_str(&self.database_url)
            .map_err(|e| CatalogError::Config(format!("invalid database_url: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(self.busy_timeout_secs));

        Ok(options)
    }

    /// Point at a database file, keeping every other setting
    #[must_use]
    pub fn with_database_path(mut self, path: &Path) -> Self {
        self.database_url = format!("sqlite://{}", path.display());
        self
    }
}

// Default values
fn default_database_url() -> String {
    "sqlite://calmwave.db".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_schema() -> String {
    "calmwave".to_string()
}

fn default_username() -> String {
    "root".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

fn default_busy_timeout_secs() -> u64 {
    30
}

fn default_credential_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            host: default_host(),
            port: default_port(),
            schema: default_schema(),
            username: default_username(),
            credential: Secret::default(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            busy_timeout_secs: default_busy_timeout_secs(),
            statement_timeout_ms: None,
            credential_cost: default_credential_cost(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_legacy_deployment() {
        let config = StorageConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.schema, "calmwave");
        assert_eq!(config.username, "root");
        assert!(config.credential.is_empty());
        assert!(config.validate().is_ok());
        assert_eq!(config.connection_label(), "root@127.0.0.1:3306/calmwave");
    }

    #[test]
    fn label_never_shows_credential() {
        let config = StorageConfig {
            credential: Secret::new("topsecret"),
            ..StorageConfig::default()
        };
        let label = config.connection_label();
        assert!(!label.contains("topsecret"));
        assert!(label.contains(":***@"));
        assert!(!format!("{:?}", config).contains("topsecret"));
    }

    #[test]
    fn server_coordinates_are_rejected_for_sqlite() {
        let config = StorageConfig {
            host: "db.invalid".to_string(),
            port: 1,
            schema: "does_not_exist".to_string(),
            username: "nobody".to_string(),
            credential: Secret::new("wrong"),
            ..StorageConfig::default()
        };

        let err = config.validate().unwrap_err();
        let CatalogError::Config(message) = err else {
            panic!("expected a config error, got {err:?}");
        };
        for key in ["host", "port", "schema", "username", "credential"] {
            assert!(message.contains(key), "{message}");
        }
        assert!(!message.contains("wrong"));

        let only_port = StorageConfig {
            port: 5432,
            ..StorageConfig::default()
        };
        assert!(only_port.validate().is_err());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let zero_pool = StorageConfig {
            max_connections: 0,
            ..StorageConfig::default()
        };
        assert!(zero_pool.validate().is_err());

        let weak_cost = StorageConfig {
            credential_cost: 2,
            ..StorageConfig::default()
        };
        assert!(weak_cost.validate().is_err());
    }

    #[test]
    fn loads_file_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calmwave.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "database_url = \"sqlite://catalog.db\"").unwrap();
        writeln!(file, "max_connections = 2").unwrap();
        writeln!(file, "statement_timeout_ms = 1500").unwrap();
        drop(file);

        let config = StorageConfig::load(Some(&path)).unwrap();
        assert_eq!(config.database_url, "sqlite://catalog.db");
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.statement_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.port, 3306);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = StorageConfig::load(Some(Path::new("/nonexistent/calmwave.toml"))).unwrap_err();
        assert!(matches!(err, CatalogError::Config(_)));
    }

    #[test]
    fn connect_options_accept_sqlite_urls() {
        let config = StorageConfig::default();
        assert!(config.connect_options().is_ok());
    }
}
