use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 6379;
pub const DEFAULT_DB: i64 = 0;

/// Connection parameters for the backing store.
///
/// Constructed once per [`Queue`](crate::Queue) and never mutated
/// afterwards. Options liteq does not recognize are collected into `extra`
/// and handed to the connector unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub password: Option<String>,

    /// Unrecognized options, passed through to the store connector.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db: DEFAULT_DB,
            password: None,
            extra: BTreeMap::new(),
        }
    }
}

impl StoreConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        StoreConfig {
            host: host.into(),
            port,
            ..StoreConfig::default()
        }
    }

    /// Render a `redis://` connection URL for this configuration.
    pub fn redis_url(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password, self.host, self.port, self.db
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_store() {
        let config = StoreConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 6379);
        assert_eq!(config.db, 0);
        assert!(config.password.is_none());
        assert!(config.extra.is_empty());
    }

    #[test]
    fn partial_deserialization_fills_defaults() {
        let config: StoreConfig = serde_json::from_str(r#"{"host":"redis.internal"}"#).unwrap();
        assert_eq!(config.host, "redis.internal");
        assert_eq!(config.port, 6379);
        assert_eq!(config.db, 0);
    }

    #[test]
    fn unknown_options_pass_through() {
        let config: StoreConfig = serde_json::from_str(r#"{"port":6380,"tls":true}"#).unwrap();
        assert_eq!(config.port, 6380);
        assert_eq!(config.extra.get("tls"), Some(&serde_json::Value::Bool(true)));
    }

    #[test]
    fn url_rendering_with_and_without_password() {
        let mut config = StoreConfig::default();
        assert_eq!(config.redis_url(), "redis://localhost:6379/0");

        config.password = Some("hunter2".to_string());
        assert_eq!(config.redis_url(), "redis://:hunter2@localhost:6379/0");
    }
}
