//! Notebook settings.
//!
//! Settings are read from a JSON file using the same keys a notebook host
//! exposes, e.g.:
//!
//! ```json
//! {
//!   "useNamespaces": true,
//!   "markdownIntegration.enabled": true,
//!   "activeConnection": "local",
//!   "connections": [
//!     { "name": "local", "endpointURL": "http://localhost:7878/query" }
//!   ]
//! }
//! ```
//!
//! The core only ever reads settings; nothing here is written back.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable naming an explicit settings file.
pub const CONFIG_ENV_VAR: &str = "SPARQLBOOK_CONFIG";

/// A configured endpoint connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConnection {
    /// Display name
    #[serde(default)]
    pub name: String,

    /// Endpoint URL
    #[serde(rename = "endpointURL")]
    pub endpoint_url: String,

    /// Basic-auth user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Basic-auth password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl EndpointConnection {
    /// Connection to a URL without credentials.
    pub fn anonymous(endpoint_url: impl Into<String>) -> Self {
        let endpoint_url = endpoint_url.into();
        Self {
            name: endpoint_url.clone(),
            endpoint_url,
            user: None,
            password: None,
        }
    }
}

/// Settings read by the execution pipeline and the document converter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Rewrite URIs in SELECT results using the query's PREFIX declarations.
    #[serde(rename = "useNamespaces", default = "default_true")]
    pub use_namespaces: bool,

    /// Allow markdown files to be opened as notebooks.
    #[serde(rename = "markdownIntegration.enabled", default = "default_true")]
    pub markdown_integration_enabled: bool,

    /// Name of the connection used when a cell has no endpoint directive.
    #[serde(
        rename = "activeConnection",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub active_connection: Option<String>,

    /// Known connections.
    #[serde(default)]
    pub connections: Vec<EndpointConnection>,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_namespaces: true,
            markdown_integration_enabled: true,
            active_connection: None,
            connections: Vec::new(),
        }
    }
}

impl Settings {
    /// Parse settings from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Config {
            path: None,
            message: e.to_string(),
        })
    }

    /// Load settings from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::Config {
            path: Some(path.to_path_buf()),
            message: e.to_string(),
        })?;

        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&text).map_err(|e| Error::Config {
            path: Some(path.to_path_buf()),
            message: e.to_string(),
        })
    }

    /// Load settings from the first location that applies.
    ///
    /// An explicit path or `SPARQLBOOK_CONFIG` must exist; the per-user
    /// default file is optional and missing means defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        Self::discover_with(explicit, std::env::var_os(CONFIG_ENV_VAR))
    }

    fn discover_with(explicit: Option<&Path>, from_env: Option<OsString>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Some(path) = from_env
            && !path.is_empty()
        {
            return Self::load(path);
        }

        match default_settings_path() {
            Some(path) if path.exists() => {
                tracing::debug!("Loading settings from {}", path.display());
                Self::load(path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// The connection selected by `activeConnection`.
    pub fn active_connection(&self) -> Option<&EndpointConnection> {
        let name = self.active_connection.as_deref()?;
        self.connection(name)
    }

    /// Look up a connection by name.
    pub fn connection(&self, name: &str) -> Option<&EndpointConnection> {
        self.connections.iter().find(|c| c.name == name)
    }
}

/// Per-user settings file: `<config_dir>/sparqlbook/settings.json`.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sparqlbook").join("settings.json"))
}
