//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (users reference existing clusters and credentials)
//! - Validate node addresses and allowed networks
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no clusters configured")]
    NoClusters,

    #[error("no users configured")]
    NoUsers,

    #[error("duplicate cluster {0:?}")]
    DuplicateCluster(String),

    #[error("cluster {0:?} has no nodes")]
    EmptyCluster(String),

    #[error("cluster {cluster:?}: invalid node address {address:?}")]
    InvalidNode { cluster: String, address: String },

    #[error("cluster {cluster:?}: duplicate user {user:?}")]
    DuplicateClusterUser { cluster: String, user: String },

    #[error("cluster {0:?}: kill_query_user name must not be empty")]
    EmptyKillQueryUser(String),

    #[error("duplicate user {0:?}")]
    DuplicateUser(String),

    #[error("user {user:?} routes to unknown cluster {cluster:?}")]
    UnknownCluster { user: String, cluster: String },

    #[error("user {user:?} routes to unknown user {to_user:?} of cluster {cluster:?}")]
    UnknownClusterUser {
        user: String,
        cluster: String,
        to_user: String,
    },

    #[error("user {user:?}: invalid allowed network {network:?}")]
    InvalidNetwork { user: String, network: String },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.clusters.is_empty() {
        errors.push(ValidationError::NoClusters);
    }
    if config.users.is_empty() {
        errors.push(ValidationError::NoUsers);
    }

    // cluster name -> credential names
    let mut clusters: HashMap<&str, HashSet<&str>> = HashMap::new();
    for cluster in &config.clusters {
        if clusters.contains_key(cluster.name.as_str()) {
            errors.push(ValidationError::DuplicateCluster(cluster.name.clone()));
            continue;
        }

        if cluster.nodes.is_empty() {
            errors.push(ValidationError::EmptyCluster(cluster.name.clone()));
        }
        for address in &cluster.nodes {
            if !is_valid_node(address) {
                errors.push(ValidationError::InvalidNode {
                    cluster: cluster.name.clone(),
                    address: address.clone(),
                });
            }
        }

        let mut users = HashSet::new();
        for user in &cluster.users {
            if !users.insert(user.name.as_str()) {
                errors.push(ValidationError::DuplicateClusterUser {
                    cluster: cluster.name.clone(),
                    user: user.name.clone(),
                });
            }
        }

        if let Some(kill) = &cluster.kill_query_user {
            if kill.name.is_empty() {
                errors.push(ValidationError::EmptyKillQueryUser(cluster.name.clone()));
            }
        }

        clusters.insert(cluster.name.as_str(), users);
    }

    let mut seen = HashSet::new();
    for user in &config.users {
        if !seen.insert(user.name.as_str()) {
            errors.push(ValidationError::DuplicateUser(user.name.clone()));
        }

        match clusters.get(user.to_cluster.as_str()) {
            None => errors.push(ValidationError::UnknownCluster {
                user: user.name.clone(),
                cluster: user.to_cluster.clone(),
            }),
            Some(credentials) if !credentials.contains(user.to_user.as_str()) => {
                errors.push(ValidationError::UnknownClusterUser {
                    user: user.name.clone(),
                    cluster: user.to_cluster.clone(),
                    to_user: user.to_user.clone(),
                })
            }
            Some(_) => {}
        }

        for network in &user.allowed_networks {
            if !is_valid_network(network) {
                errors.push(ValidationError::InvalidNetwork {
                    user: user.name.clone(),
                    network: network.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_node(address: &str) -> bool {
    match Url::parse(address) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// Accepts a bare address or `address/prefix`.
fn is_valid_network(network: &str) -> bool {
    let (addr, prefix) = match network.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (network, None),
    };

    let Ok(ip) = addr.parse::<IpAddr>() else {
        return false;
    };
    let max = if ip.is_ipv4() { 32 } else { 128 };

    match prefix {
        None => true,
        Some(p) => p.parse::<u8>().map(|p| p <= max).unwrap_or(false),
    }
}
