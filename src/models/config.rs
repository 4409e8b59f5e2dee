//! Configuration model loaded from external sources.

use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Talk to the ParkEase backend over REST.
    #[default]
    Http,
    /// Serve mock data from the local SQLite store.
    Local,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub mode: BackendMode,
    pub api_url: String,
    pub database_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LiveConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Socket.IO server, e.g. `http://localhost:5000`.
    pub url: String,
}

#[derive(Clone, Debug, Deserialize)]
/// Basic configuration shared across handlers.
pub struct ServerConfig {
    pub domain: String,
    pub address: String,
    pub port: u16,
    pub secret: String,
    pub templates_dir: String,
    pub backend: BackendConfig,
    pub live: LiveConfig,
}

fn default_timeout_secs() -> u64 {
    10
}
