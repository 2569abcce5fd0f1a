//! Connection settings.
//!
//! The layer does not open connections itself, but dialects know how to turn
//! a settings block into the JDBC-style URL their driver expects, including
//! host/port defaulting.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Database connection settings, as deserialized from application config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionSettings {
    /// Database name (or file path for SQLite).
    pub name: String,

    /// Host name; defaults to `localhost` when empty.
    #[serde(default)]
    pub host: String,

    /// Port; falls back to the dialect's default port when absent.
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// Driver-specific extra options, passed through verbatim.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl ConnectionSettings {
    pub fn new(name: impl Into<String>) -> Self {
        ConnectionSettings {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Effective host, with the `localhost` default applied.
    pub fn effective_host(&self) -> &str {
        if self.host.is_empty() {
            "localhost"
        } else {
            &self.host
        }
    }

    /// The `:port` URL segment, or empty when neither the settings nor the
    /// dialect supply a port.
    pub fn port_segment(&self, default_port: Option<u16>) -> String {
        match self.port.or(default_port) {
            Some(p) => format!(":{p}"),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_host_defaults_to_localhost() {
        let settings = ConnectionSettings::new("app");
        assert_eq!(settings.effective_host(), "localhost");

        let settings = ConnectionSettings::new("app").with_host("db.internal");
        assert_eq!(settings.effective_host(), "db.internal");
    }

    #[test]
    fn test_port_segment_fallback() {
        let settings = ConnectionSettings::new("app");
        assert_eq!(settings.port_segment(Some(5432)), ":5432");
        assert_eq!(settings.port_segment(None), "");

        let settings = settings.with_port(15432);
        assert_eq!(settings.port_segment(Some(5432)), ":15432");
    }
}
