//! Where the terminus finds its server and port.
//!
//! # Design
//! `TerminusConfig` only names settings; the values live in a `Settings`
//! source that is consulted on every call. `MapSettings` is the in-process
//! source: it can be loaded from a JSON document and changed while the
//! terminus is in use, and the next call sees the change.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Deserialize;

use crate::error::{Result, TerminusError};

/// Read access to named settings.
pub trait Settings: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
}

/// Which settings supply the server name and port for a terminus.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TerminusConfig {
    pub server_setting: String,
    pub port_setting: String,
}

impl TerminusConfig {
    pub const DEFAULT_SERVER_SETTING: &'static str = "server";
    pub const DEFAULT_PORT_SETTING: &'static str = "masterport";

    pub fn use_server_setting(mut self, name: impl Into<String>) -> Self {
        self.server_setting = name.into();
        self
    }

    pub fn use_port_setting(mut self, name: impl Into<String>) -> Self {
        self.port_setting = name.into();
        self
    }

    pub(crate) fn resolve_server(&self, settings: &dyn Settings) -> Result<String> {
        settings
            .get(&self.server_setting)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| TerminusError::Config(format!("setting '{}' is not set", self.server_setting)))
    }

    pub(crate) fn resolve_port(&self, settings: &dyn Settings) -> Result<u16> {
        let raw = settings
            .get(&self.port_setting)
            .ok_or_else(|| TerminusError::Config(format!("setting '{}' is not set", self.port_setting)))?;
        raw.trim().parse::<u16>().map_err(|_| {
            TerminusError::Config(format!(
                "setting '{}' is not a valid port: {raw:?}",
                self.port_setting
            ))
        })
    }
}

impl Default for TerminusConfig {
    fn default() -> Self {
        Self {
            server_setting: Self::DEFAULT_SERVER_SETTING.to_string(),
            port_setting: Self::DEFAULT_PORT_SETTING.to_string(),
        }
    }
}

/// Mutable in-memory settings.
#[derive(Debug, Default)]
pub struct MapSettings {
    values: RwLock<HashMap<String, String>>,
}

impl MapSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self {
            values: RwLock::new(values),
        }
    }

    /// Load from a flat JSON object. Numbers and booleans are stored in
    /// their textual form; nested values are rejected.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, serde_json::Value> = serde_json::from_str(json)
            .map_err(|e| TerminusError::Config(format!("invalid settings document: {e}")))?;
        let mut values = HashMap::with_capacity(raw.len());
        for (name, value) in raw {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                other => {
                    return Err(TerminusError::Config(format!(
                        "setting '{name}' must be a scalar, got {other}"
                    )))
                }
            };
            values.insert(name, text);
        }
        Ok(Self {
            values: RwLock::new(values),
        })
    }

    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        self.values.write().insert(name.into(), value.into());
    }

    pub fn remove(&self, name: &str) -> Option<String> {
        self.values.write().remove(name)
    }
}

impl Settings for MapSettings {
    fn get(&self, name: &str) -> Option<String> {
        self.values.read().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_name_server_and_masterport() {
        let config = TerminusConfig::default();
        assert_eq!(config.server_setting, "server");
        assert_eq!(config.port_setting, "masterport");
    }

    #[test]
    fn declared_settings_replace_defaults() {
        let config = TerminusConfig::default()
            .use_server_setting("ca_server")
            .use_port_setting("ca_port");
        let settings = MapSettings::from_pairs([("ca_server", "ca.example.com"), ("ca_port", "8141")]);
        assert_eq!(config.resolve_server(&settings).unwrap(), "ca.example.com");
        assert_eq!(config.resolve_port(&settings).unwrap(), 8141);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: TerminusConfig = serde_json::from_str(r#"{"server_setting":"report_server"}"#).unwrap();
        assert_eq!(config.server_setting, "report_server");
        assert_eq!(config.port_setting, "masterport");
    }

    #[test]
    fn changes_are_visible_on_next_resolve() {
        let config = TerminusConfig::default();
        let settings = MapSettings::from_pairs([("server", "old.example.com"), ("masterport", "8140")]);
        assert_eq!(config.resolve_server(&settings).unwrap(), "old.example.com");
        settings.set("server", "new.example.com");
        assert_eq!(config.resolve_server(&settings).unwrap(), "new.example.com");
    }

    #[test]
    fn missing_or_garbled_port_is_a_config_error() {
        let config = TerminusConfig::default();
        let settings = MapSettings::new();
        assert!(matches!(config.resolve_port(&settings), Err(TerminusError::Config(_))));
        settings.set("masterport", "eighty");
        assert!(matches!(config.resolve_port(&settings), Err(TerminusError::Config(_))));
        assert!(matches!(config.resolve_server(&settings), Err(TerminusError::Config(_))));
    }

    #[test]
    fn json_settings_stringify_scalars() {
        let settings = MapSettings::from_json(r#"{"server":"puppet","masterport":8140,"http_compression":true}"#).unwrap();
        assert_eq!(settings.get("server").as_deref(), Some("puppet"));
        assert_eq!(settings.get("masterport").as_deref(), Some("8140"));
        assert_eq!(settings.get("http_compression").as_deref(), Some("true"));
        assert!(MapSettings::from_json(r#"{"server":{"nested":1}}"#).is_err());
        assert!(MapSettings::from_json("not json").is_err());
    }
}
