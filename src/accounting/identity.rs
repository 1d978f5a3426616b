//! Identity records.
//!
//! # Responsibilities
//! - Represent a proxy-facing user and the backend credential it maps to
//! - Carry per-identity ceilings (concurrent queries, execution time)
//! - Track running queries through an embedded [`Counter`]
//!
//! # Design Decisions
//! - Records are built once from configuration and shared via `Arc`
//! - Only the counter is mutated after construction
//! - A ceiling of zero means unlimited

use std::time::Duration;

use crate::accounting::counter::Counter;
use crate::config::{ClusterUserConfig, UserConfig};

/// A proxy-facing user.
#[derive(Debug)]
pub struct ExternalUser {
    pub name: String,
    pub password: String,
    /// Name of the cluster this user is routed to.
    pub to_cluster: String,
    /// Name of the backend credential this user runs queries as.
    pub to_user: String,
    /// Source networks the user may connect from (checked by the caller).
    pub allowed_networks: Vec<String>,
    pub max_execution_time: Duration,
    pub max_concurrent_queries: u32,
    pub counter: Counter,
}

impl ExternalUser {
    pub fn new(
        name: impl Into<String>,
        to_cluster: impl Into<String>,
        to_user: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            password: String::new(),
            to_cluster: to_cluster.into(),
            to_user: to_user.into(),
            allowed_networks: Vec::new(),
            max_execution_time: Duration::ZERO,
            max_concurrent_queries: 0,
            counter: Counter::new(),
        }
    }

    pub fn from_config(config: &UserConfig) -> Self {
        Self {
            name: config.name.clone(),
            password: config.password.clone(),
            to_cluster: config.to_cluster.clone(),
            to_user: config.to_user.clone(),
            allowed_networks: config.allowed_networks.clone(),
            max_execution_time: Duration::from_secs(config.max_execution_time_secs),
            max_concurrent_queries: config.max_concurrent_queries,
            counter: Counter::new(),
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn with_max_concurrent_queries(mut self, max: u32) -> Self {
        self.max_concurrent_queries = max;
        self
    }

    pub fn with_max_execution_time(mut self, max: Duration) -> Self {
        self.max_execution_time = max;
        self
    }

    pub fn running_queries(&self) -> u32 {
        self.counter.read()
    }
}

/// Credential used against the backend cluster.
///
/// Several external users may share one credential; its counter is the
/// aggregate of all of them.
#[derive(Debug)]
pub struct BackendCredential {
    pub name: String,
    pub password: String,
    pub max_execution_time: Duration,
    pub max_concurrent_queries: u32,
    pub counter: Counter,
}

impl BackendCredential {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: String::new(),
            max_execution_time: Duration::ZERO,
            max_concurrent_queries: 0,
            counter: Counter::new(),
        }
    }

    pub fn from_config(config: &ClusterUserConfig) -> Self {
        Self {
            name: config.name.clone(),
            password: config.password.clone(),
            max_execution_time: Duration::from_secs(config.max_execution_time_secs),
            max_concurrent_queries: config.max_concurrent_queries,
            counter: Counter::new(),
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn with_max_concurrent_queries(mut self, max: u32) -> Self {
        self.max_concurrent_queries = max;
        self
    }

    pub fn with_max_execution_time(mut self, max: Duration) -> Self {
        self.max_execution_time = max;
        self
    }

    pub fn running_queries(&self) -> u32 {
        self.counter.read()
    }
}

/// True when `count` is above a non-zero ceiling.
pub(crate) fn exceeds(count: u32, ceiling: u32) -> bool {
    ceiling > 0 && count > ceiling
}
