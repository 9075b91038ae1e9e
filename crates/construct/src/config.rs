//! # Stack Configuration
//!
//! Read access to the configuration a construct call carries. Keys are stored
//! fully qualified (`namespace:name`); lookups with a bare name are qualified
//! with the accessor's namespace, which defaults to the project name.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration key '{0}'")]
    Missing(String),
    #[error("configuration key '{key}' expected {expected}, found '{value}'")]
    Invalid { key: String, expected: &'static str, value: String },
    #[error("configuration key '{key}' is not valid json: {source}")]
    Json { key: String, source: serde_json::Error },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// A namespaced view over the run's configuration map.
#[derive(Debug, Clone)]
pub struct Config {
    namespace: String,
    values: Arc<BTreeMap<String, String>>,
}

impl Config {
    pub fn new(namespace: impl Into<String>, values: Arc<BTreeMap<String, String>>) -> Self {
        Self { namespace: namespace.into(), values }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Qualifies `key` with the namespace unless it already names one.
    pub fn full_key(&self, key: &str) -> String {
        if key.contains(':') { key.to_string() } else { format!("{}:{}", self.namespace, key) }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&self.full_key(key)).map(String::as_str)
    }

    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| ConfigError::Missing(self.full_key(key)))
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        self.parse(key, "a bool", |s| s.parse().ok())
    }

    pub fn get_int(&self, key: &str) -> Result<Option<i64>> {
        self.parse(key, "an integer", |s| s.parse().ok())
    }

    pub fn get_float(&self, key: &str) -> Result<Option<f64>> {
        self.parse(key, "a number", |s| s.parse().ok())
    }

    /// Parses a JSON-encoded value.
    pub fn get_object<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        serde_json::from_str(raw)
            .map(Some)
            .map_err(|source| ConfigError::Json { key: self.full_key(key), source })
    }

    pub fn require_bool(&self, key: &str) -> Result<bool> {
        self.get_bool(key)?.ok_or_else(|| ConfigError::Missing(self.full_key(key)))
    }

    pub fn require_int(&self, key: &str) -> Result<i64> {
        self.get_int(key)?.ok_or_else(|| ConfigError::Missing(self.full_key(key)))
    }

    pub fn require_float(&self, key: &str) -> Result<f64> {
        self.get_float(key)?.ok_or_else(|| ConfigError::Missing(self.full_key(key)))
    }

    pub fn require_object<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.get_object(key)?.ok_or_else(|| ConfigError::Missing(self.full_key(key)))
    }

    fn parse<T>(&self, key: &str, expected: &'static str, f: impl FnOnce(&str) -> Option<T>) -> Result<Option<T>> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        match f(raw) {
            Some(v) => Ok(Some(v)),
            None => Err(ConfigError::Invalid { key: self.full_key(key), expected, value: raw.to_string() }),
        }
    }
}
