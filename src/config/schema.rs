//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy core.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::cluster::kill::DEFAULT_KILL_TIMEOUT;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Logging settings.
    pub log: LogConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Backend clusters.
    pub clusters: Vec<ClusterConfig>,

    /// Proxy-facing users.
    pub users: Vec<UserConfig>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "query_proxy=info,tower_http=info".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// A backend cluster.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusterConfig {
    /// Unique cluster name users route to.
    pub name: String,

    /// Node base URLs, in selection order (e.g. "http://10.0.0.1:8123").
    pub nodes: Vec<String>,

    /// Credentials valid on this cluster.
    #[serde(default)]
    pub users: Vec<ClusterUserConfig>,

    /// Credential used to issue kill statements. Disabled when absent.
    #[serde(default)]
    pub kill_query_user: Option<KillQueryUserConfig>,

    /// Client-side timeout for kill requests in seconds.
    #[serde(default = "default_kill_query_timeout")]
    pub kill_query_timeout_secs: u64,
}

fn default_kill_query_timeout() -> u64 {
    DEFAULT_KILL_TIMEOUT.as_secs()
}

/// A backend credential.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusterUserConfig {
    pub name: String,

    #[serde(default)]
    pub password: String,

    /// Execution-time budget in seconds (0 = unlimited).
    #[serde(default)]
    pub max_execution_time_secs: u64,

    /// Concurrent-query ceiling (0 = unlimited).
    #[serde(default)]
    pub max_concurrent_queries: u32,
}

/// Administrative credential for kill statements.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KillQueryUserConfig {
    pub name: String,

    #[serde(default)]
    pub password: String,
}

/// A proxy-facing user.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    pub name: String,

    #[serde(default)]
    pub password: String,

    /// Cluster the user is routed to.
    pub to_cluster: String,

    /// Cluster credential the user runs queries as.
    pub to_user: String,

    /// Allowed source networks ("10.0.0.0/8", "127.0.0.1"). Empty allows all.
    #[serde(default)]
    pub allowed_networks: Vec<String>,

    /// Execution-time budget in seconds (0 = unlimited).
    #[serde(default)]
    pub max_execution_time_secs: u64,

    /// Concurrent-query ceiling (0 = unlimited).
    #[serde(default)]
    pub max_concurrent_queries: u32,
}
