//! Loader configuration file support
//!
//! Handles parsing of `oecd-loader.toml` configuration files and
//! environment variable overrides. The core components never read the
//! environment themselves; they receive the sections of a `LoaderConfig`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::database::{DatabaseError, DatabaseResult};
use crate::models::Entity;

/// Default configuration filename
pub const CONFIG_FILENAME: &str = "oecd-loader.toml";

/// Environment variable for the warehouse host
pub const ENV_REDSHIFT_HOST: &str = "REDSHIFT_HOST";

/// Environment variable for the warehouse port
pub const ENV_REDSHIFT_PORT: &str = "REDSHIFT_PORT";

/// Environment variable for the warehouse database name
pub const ENV_REDSHIFT_DB: &str = "REDSHIFT_DB";

/// Environment variable for the warehouse user
pub const ENV_REDSHIFT_USER: &str = "REDSHIFT_USER";

/// Environment variable for the warehouse password
pub const ENV_REDSHIFT_PASSWORD: &str = "REDSHIFT_PASSWORD";

/// Environment variable for the role the warehouse assumes to read the bucket
pub const ENV_IAM_ROLE: &str = "IAM_ROLE";

/// Environment variable for the staging bucket
pub const ENV_S3_BUCKET: &str = "OECD_S3_BUCKET";

/// Environment variable for the staging key prefix
pub const ENV_S3_PREFIX: &str = "OECD_S3_PREFIX";

/// Environment variable for the local data directory
pub const ENV_DATA_DIR: &str = "OECD_DATA_DIR";

/// Warehouse connection section
#[derive(Clone, Serialize, Deserialize)]
pub struct WarehouseSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default)]
    pub user: String,

    /// Usually supplied through `REDSHIFT_PASSWORD` rather than the file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Connect timeout; the driver default applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5439
}

fn default_database() -> String {
    "dev".to_string()
}

impl Default for WarehouseSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: default_database(),
            user: String::new(),
            password: None,
            connect_timeout_secs: None,
        }
    }
}

impl WarehouseSection {
    /// `user@host:port/database`, never including the password
    pub fn summary(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}

impl std::fmt::Debug for WarehouseSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarehouseSection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Object-store staging section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Key prefix inside the bucket; files land at `{prefix}/{filename}`
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Local directory holding the flat files
    #[serde(default = "default_local_dir")]
    pub local_dir: PathBuf,

    /// File extension to publish, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

fn default_bucket() -> String {
    "oecd-countries-data".to_string()
}

fn default_prefix() -> String {
    "csv".to_string()
}

fn default_local_dir() -> PathBuf {
    PathBuf::from("../data")
}

fn default_extension() -> String {
    "csv".to_string()
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            prefix: default_prefix(),
            local_dir: default_local_dir(),
            extension: default_extension(),
            region: None,
        }
    }
}

/// One table of the load mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    /// Warehouse table name
    pub name: String,

    /// Staged file name; defaults to `{name}.csv`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Tables whose rows must be loaded before this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

impl TableEntry {
    /// Staged file name for this table
    pub fn file_name(&self) -> String {
        self.file
            .clone()
            .unwrap_or_else(|| format!("{}.csv", self.name))
    }
}

/// Bulk-load section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadSection {
    /// Role the warehouse assumes to read the staged files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iam_role: Option<String>,

    /// Header rows to skip in each file
    #[serde(default = "default_ignore_header")]
    pub ignore_header: u32,

    /// Load mapping, in load order. Empty means the default six tables.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<TableEntry>,
}

fn default_ignore_header() -> u32 {
    1
}

impl Default for LoadSection {
    fn default() -> Self {
        Self {
            iam_role: None,
            ignore_header: default_ignore_header(),
            tables: Vec::new(),
        }
    }
}

impl LoadSection {
    /// The configured mapping, or the default one derived from the entity catalogue
    pub fn table_entries(&self) -> Vec<TableEntry> {
        if !self.tables.is_empty() {
            return self.tables.clone();
        }
        default_table_entries()
    }
}

/// Root first, then each dependent referencing it
pub fn default_table_entries() -> Vec<TableEntry> {
    Entity::ALL
        .into_iter()
        .map(|entity| TableEntry {
            name: entity.table_name().to_string(),
            file: Some(entity.source_file().to_string()),
            references: entity
                .foreign_key()
                .map(|fk| vec![fk.references.table_name().to_string()])
                .unwrap_or_default(),
        })
        .collect()
}

/// Main configuration structure
///
/// Represents the `oecd-loader.toml` configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoaderConfig {
    #[serde(default)]
    pub warehouse: WarehouseSection,

    #[serde(default)]
    pub storage: StorageSection,

    #[serde(default)]
    pub load: LoadSection,
}

impl LoaderConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    ///
    /// Falls back to defaults if the file does not exist, then applies
    /// environment overrides.
    pub fn load(path: &Path) -> DatabaseResult<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| DatabaseError::IoError(format!("Failed to read config: {}", e)))?;

            Self::parse(&content)?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> DatabaseResult<Self> {
        toml::from_str(content)
            .map_err(|e| DatabaseError::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> DatabaseResult<()> {
        let content = self.to_toml()?;

        std::fs::write(path, content)
            .map_err(|e| DatabaseError::IoError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Convert configuration to TOML string
    pub fn to_toml(&self) -> DatabaseResult<String> {
        toml::to_string_pretty(self).map_err(|e| {
            DatabaseError::SerializationError(format!("Failed to serialize config: {}", e))
        })
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_REDSHIFT_HOST) {
            self.warehouse.host = host;
        }

        if let Some(port) = lookup(ENV_REDSHIFT_PORT) {
            match port.parse() {
                Ok(port) => self.warehouse.port = port,
                Err(_) => tracing::warn!(value = %port, "ignoring invalid {}", ENV_REDSHIFT_PORT),
            }
        }

        if let Some(database) = lookup(ENV_REDSHIFT_DB) {
            self.warehouse.database = database;
        }

        if let Some(user) = lookup(ENV_REDSHIFT_USER) {
            self.warehouse.user = user;
        }

        if let Some(password) = lookup(ENV_REDSHIFT_PASSWORD) {
            self.warehouse.password = Some(password);
        }

        if let Some(role) = lookup(ENV_IAM_ROLE) {
            self.load.iam_role = Some(role);
        }

        if let Some(bucket) = lookup(ENV_S3_BUCKET) {
            self.storage.bucket = bucket;
        }

        if let Some(prefix) = lookup(ENV_S3_PREFIX) {
            self.storage.prefix = prefix;
        }

        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.storage.local_dir = PathBuf::from(dir);
        }
    }

    /// Check the settings every warehouse command needs
    pub fn validate_warehouse(&self) -> DatabaseResult<()> {
        if self.warehouse.host.trim().is_empty() {
            return Err(DatabaseError::ConfigError(
                "warehouse host is not set".to_string(),
            ));
        }
        if self.warehouse.user.trim().is_empty() {
            return Err(DatabaseError::ConfigError(format!(
                "warehouse user is not set (set [warehouse].user or {})",
                ENV_REDSHIFT_USER
            )));
        }
        Ok(())
    }

    /// The access role, required by bulk loads
    pub fn iam_role(&self) -> DatabaseResult<&str> {
        self.load
            .iam_role
            .as_deref()
            .filter(|role| !role.trim().is_empty())
            .ok_or_else(|| {
                DatabaseError::ConfigError(format!(
                    "load role is not set (set [load].iam_role or {})",
                    ENV_IAM_ROLE
                ))
            })
    }
}

/// Generate a sample configuration file content
pub fn sample_config() -> &'static str {
    r#"# OECD loader configuration
# Credentials are usually supplied through the environment or a .env file:
#   REDSHIFT_HOST, REDSHIFT_PORT, REDSHIFT_DB, REDSHIFT_USER, REDSHIFT_PASSWORD, IAM_ROLE

[warehouse]
host = "localhost"
port = 5439
database = "dev"
user = "awsuser"
# connect_timeout_secs = 30

[storage]
bucket = "oecd-countries-data"
prefix = "csv"
local_dir = "../data"
extension = "csv"
# region = "us-east-1"

[load]
# iam_role = "arn:aws:iam::123456789012:role/RedshiftCopyRole"
ignore_header = 1

# Load mapping, in load order. Leave out to load the default six tables.
# Tables listed in `references` must appear earlier in the list.
# [[load.tables]]
# name = "countries"
# file = "countries.csv"
#
# [[load.tables]]
# name = "economies"
# file = "economies.csv"
# references = ["countries"]
"#
}
