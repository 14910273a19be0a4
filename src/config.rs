use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::catalog::Catalog;
use crate::{Error, Result};

/// Where and as whom to connect the publish sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(default)]
pub struct SinkConfig {
    /// Empty means there is no network sink.
    #[builder(default, setter(into))]
    pub host: String,
    #[builder(default = 1883)]
    pub port: u16,
    #[builder(default, setter(into))]
    pub username: String,
    #[builder(default, setter(into))]
    pub password: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig::builder().build()
    }
}

/// Bridge configuration.
///
/// Every field has a default, so `{}` is a valid configuration file.
///
/// # Example
/// ```
/// use nasa::config::Config;
///
/// let config = Config::builder().debug_log_messages(true).build();
/// assert_eq!(config.namespace, "samsung_ehs");
/// assert_eq!(config.sink.port, 1883);
/// assert!(config.debug_log_messages);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(default)]
pub struct Config {
    #[builder(default)]
    pub sink: SinkConfig,
    /// Topic namespace for allow-listed values.
    #[builder(default = String::from("samsung_ehs"), setter(into))]
    pub namespace: String,
    /// Topic namespace for per-message debug publishing.
    #[builder(default = String::from("samsung_ehs_debug"), setter(into))]
    pub debug_namespace: String,
    /// Log every decoded packet and publish every message under the debug namespace.
    #[builder(default)]
    pub debug_log_messages: bool,
    /// Log every completed frame as hex before decoding.
    #[builder(default)]
    pub debug_log_messages_raw: bool,
    #[builder(default = 500)]
    pub frame_timeout_ms: u64,
    /// Restart framing when a start byte shows up in the middle of a frame.
    #[builder(default = true)]
    pub resync_on_start_marker: bool,
    /// Period of connection attempts and device reports.
    #[builder(default = 30_000)]
    pub update_interval_ms: u64,
    #[builder(default = 1000)]
    pub reconnect_base_ms: u64,
    #[builder(default = 60_000)]
    pub reconnect_max_ms: u64,
    /// Extra message table merged over the built-in one.
    #[builder(default, setter(strip_option, into))]
    pub catalog: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config::builder().build()
    }
}

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    /// If the file cannot be read, is not valid JSON, or fails [validate](Config::validate).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        let config: Config = serde_json::from_reader(File::open(path)?)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// [Error::Config] describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() || self.debug_namespace.is_empty() {
            return Err(Error::Config("topic namespaces must not be empty".into()));
        }
        if self.frame_timeout_ms == 0 {
            return Err(Error::Config("frame_timeout_ms must be positive".into()));
        }
        if self.update_interval_ms == 0 {
            return Err(Error::Config("update_interval_ms must be positive".into()));
        }
        if self.reconnect_base_ms == 0 || self.reconnect_base_ms > self.reconnect_max_ms {
            return Err(Error::Config(format!(
                "reconnect back-off must satisfy 0 < base <= max, got {} and {}",
                self.reconnect_base_ms, self.reconnect_max_ms
            )));
        }
        Ok(())
    }

    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    /// The built-in message catalog, merged with the configured file if there is one.
    ///
    /// # Errors
    /// If the configured catalog file cannot be loaded.
    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog {
            Some(path) => Catalog::with_file(path, true),
            None => Ok(Catalog::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn empty_object_is_default() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.sink.host, "");
        assert_eq!(config.sink.port, 1883);
        assert_eq!(config.debug_namespace, "samsung_ehs_debug");
        assert!(!config.debug_log_messages);
        assert!(!config.debug_log_messages_raw);
        assert!(config.resync_on_start_marker);
        assert_eq!(config.frame_timeout(), Duration::from_millis(500));
        assert_eq!(config.update_interval(), Duration::from_secs(30));
        assert_eq!(config.catalog, None);
        config.validate().unwrap();
    }

    #[test]
    fn from_file() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("config.json");
        fs::write(
            &path,
            r#"{
  "sink": {"host": "broker.local", "username": "ehs"},
  "namespace": "heatpump",
  "debug_log_messages": true,
  "frame_timeout_ms": 250
}"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.sink.host, "broker.local");
        assert_eq!(config.sink.port, 1883);
        assert_eq!(config.sink.username, "ehs");
        assert_eq!(config.namespace, "heatpump");
        assert!(config.debug_log_messages);
        assert_eq!(config.frame_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn from_file_rejects_invalid() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("config.json");

        fs::write(&path, r#"{"reconnect_base_ms": 5000, "reconnect_max_ms": 10}"#).unwrap();
        assert!(matches!(Config::from_file(&path), Err(Error::Config(_))));

        fs::write(&path, r#"{"namespace": ""}"#).unwrap();
        assert!(matches!(Config::from_file(&path), Err(Error::Config(_))));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(Config::from_file(&path), Err(Error::Json(_))));

        assert!(matches!(
            Config::from_file(tmpdir.path().join("missing.json")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn load_catalog() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("messages.json");
        fs::write(
            &path,
            r#"{"version": "t", "messages": [{"number": "0x8401", "name": "X"}]}"#,
        )
        .unwrap();

        let config = Config::builder().catalog(&path).build();
        let catalog = config.load_catalog().unwrap();
        assert!(catalog.is_relevant(0x8401));
        assert!(catalog.is_relevant(0x4203));

        assert!(!Config::default().load_catalog().unwrap().is_relevant(0x8401));
    }
}
