//! # Configuration
//!
//! Settings are looked up by dotted key (`postgres.url`) through a
//! `ConfigSource`. The binary layers environment variables over an optional
//! YAML file; tests use `MapConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use log::debug;
use serde_yaml::Value;
use crate::backend::storage::error::BackendInitError;
use crate::backend::storage::factory::StorageType;
use crate::backend::storage::file::FileConnection;

/// Key/value lookup over some configuration medium
pub trait ConfigSource: Send + Sync {
    fn entry(&self, key: &str) -> Option<String>;
}

/// In-memory configuration
#[derive(Debug, Clone, Default)]
pub struct MapConfig {
    entries: HashMap<String, String>,
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.entries.insert(key.to_string(), value.into());
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), value.into());
    }
}

impl ConfigSource for MapConfig {
    fn entry(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// YAML file flattened into dotted keys
///
/// ```yaml
/// storage:
///   type: postgres
/// postgres:
///   url: postgres://carpool@localhost/carpool
/// ```
#[derive(Debug, Clone, Default)]
pub struct YamlConfig {
    entries: HashMap<String, String>,
}

impl YamlConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BackendInitError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| BackendInitError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|message| BackendInitError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        let mut entries = HashMap::new();
        match value {
            Value::Mapping(_) => flatten("", &value, &mut entries),
            Value::Null => {}
            _ => return Err("top level must be a mapping".to_string()),
        }
        Ok(Self { entries })
    }
}

fn flatten(prefix: &str, value: &Value, entries: &mut HashMap<String, String>) {
    match value {
        Value::Mapping(mapping) => {
            for (key, child) in mapping {
                let Some(key) = scalar_text(key) else { continue };
                let full_key = if prefix.is_empty() {
                    key
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&full_key, child, entries);
            }
        }
        other => {
            if let Some(text) = scalar_text(other) {
                entries.insert(prefix.to_string(), text);
            }
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

impl ConfigSource for YamlConfig {
    fn entry(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// Process environment, `postgres.url` → `CARPOOL_POSTGRES_URL`
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfig;

impl EnvConfig {
    pub fn variable_name(key: &str) -> String {
        format!("CARPOOL_{}", key.replace('.', "_").to_uppercase())
    }
}

impl ConfigSource for EnvConfig {
    fn entry(&self, key: &str) -> Option<String> {
        std::env::var(Self::variable_name(key)).ok()
    }
}

/// Ordered sources; the first one that has a key wins
#[derive(Default)]
pub struct LayeredConfig {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl LayeredConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<S: ConfigSource + 'static>(mut self, source: S) -> Self {
        self.sources.push(Box::new(source));
        self
    }
}

impl ConfigSource for LayeredConfig {
    fn entry(&self, key: &str) -> Option<String> {
        self.sources.iter().find_map(|source| source.entry(key))
    }
}

pub const DEFAULT_MONGO_DATABASE: &str = "carpool";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Typed, validated backend settings
#[derive(Debug, Clone, PartialEq)]
pub enum BackendConfig {
    Xml { root: PathBuf },
    Csv { root: PathBuf },
    Mongo { uri: String, database: String },
    Postgres { url: String, max_connections: u32 },
}

impl BackendConfig {
    pub fn from_source(source: &dyn ConfigSource) -> Result<Self, BackendInitError> {
        let storage_type = match non_empty(source, "storage.type") {
            Some(raw) => raw
                .parse::<StorageType>()
                .map_err(|e| BackendInitError::invalid("storage.type", e))?,
            None => StorageType::Csv,
        };

        let config = match storage_type {
            StorageType::Xml => BackendConfig::Xml {
                root: non_empty(source, "xml.root")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| FileConnection::default_root("xml")),
            },
            StorageType::Csv => BackendConfig::Csv {
                root: non_empty(source, "csv.root")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| FileConnection::default_root("csv")),
            },
            StorageType::Mongo => {
                let uri = required(source, "mongo.uri")?;
                if !uri.starts_with("mongodb://") && !uri.starts_with("mongodb+srv://") {
                    return Err(BackendInitError::invalid("mongo.uri", "expected a mongodb:// URI"));
                }
                BackendConfig::Mongo {
                    uri,
                    database: non_empty(source, "mongo.database")
                        .unwrap_or_else(|| DEFAULT_MONGO_DATABASE.to_string()),
                }
            }
            StorageType::Postgres => {
                let url = required(source, "postgres.url")?;
                let max_connections = match non_empty(source, "postgres.max_connections") {
                    Some(raw) => match raw.parse::<u32>() {
                        Ok(value) if value > 0 => value,
                        _ => {
                            return Err(BackendInitError::invalid(
                                "postgres.max_connections",
                                format!("expected a positive integer, got '{}'", raw),
                            ))
                        }
                    },
                    None => DEFAULT_MAX_CONNECTIONS,
                };
                BackendConfig::Postgres { url, max_connections }
            }
        };

        debug!("Resolved backend configuration for {}", config.storage_type());
        Ok(config)
    }

    pub fn storage_type(&self) -> StorageType {
        match self {
            BackendConfig::Xml { .. } => StorageType::Xml,
            BackendConfig::Csv { .. } => StorageType::Csv,
            BackendConfig::Mongo { .. } => StorageType::Mongo,
            BackendConfig::Postgres { .. } => StorageType::Postgres,
        }
    }

    /// Where the data lives, with credentials stripped from URLs
    pub fn location(&self) -> String {
        match self {
            BackendConfig::Xml { root } | BackendConfig::Csv { root } => root.display().to_string(),
            BackendConfig::Mongo { uri, database } => format!("{}/{}", redact(uri), database),
            BackendConfig::Postgres { url, .. } => redact(url),
        }
    }
}

fn non_empty(source: &dyn ConfigSource, key: &str) -> Option<String> {
    source
        .entry(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(source: &dyn ConfigSource, key: &str) -> Result<String, BackendInitError> {
    non_empty(source, key).ok_or_else(|| BackendInitError::MissingConfig(key.to_string()))
}

/// Drop the `user:password@` part of a connection URL
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***@{}", &url[..scheme_end], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}
