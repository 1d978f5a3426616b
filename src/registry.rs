//! Registry of clusters and users.
//!
//! # Responsibilities
//! - Build clusters, backend credentials and users from configuration
//! - Resolve a user to the (user, credential, cluster) triple admission needs
//! - Provide point-in-time views of live counts

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::accounting::{AdmitError, BackendCredential, ExternalUser, Scope};
use crate::cluster::{Cluster, ClusterError, ClusterSnapshot, KillQueryUser};
use crate::config::{ClusterConfig, ProxyConfig};

/// Errors raised while wiring configuration into records.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("cluster {name:?}: {source}")]
    Cluster {
        name: String,
        #[source]
        source: ClusterError,
    },

    #[error("duplicate cluster {0:?}")]
    DuplicateCluster(String),

    #[error("duplicate user {0:?}")]
    DuplicateUser(String),

    #[error("user {user:?} routes to unknown cluster {cluster:?}")]
    UnknownCluster { user: String, cluster: String },

    #[error("user {user:?} routes to unknown user {credential:?} of cluster {cluster:?}")]
    UnknownCredential {
        user: String,
        cluster: String,
        credential: String,
    },
}

/// Everything needed to admit a request for one user.
#[derive(Debug, Clone)]
pub struct Route {
    pub user: Arc<ExternalUser>,
    pub credential: Arc<BackendCredential>,
    pub cluster: Arc<Cluster>,
}

impl Route {
    pub fn admit(&self) -> Result<Scope, AdmitError> {
        Scope::admit(&self.user, &self.credential, &self.cluster)
    }
}

/// All clusters and users known to the proxy.
#[derive(Debug, Default)]
pub struct Registry {
    clusters: HashMap<String, Arc<Cluster>>,
    users: HashMap<String, Arc<ExternalUser>>,
}

impl Registry {
    pub fn from_config(config: &ProxyConfig) -> Result<Self, RegistryError> {
        let mut registry = Self::default();

        for cluster_config in &config.clusters {
            let cluster = build_cluster(cluster_config).map_err(|source| RegistryError::Cluster {
                name: cluster_config.name.clone(),
                source,
            })?;
            registry.add_cluster(cluster)?;
        }

        for user_config in &config.users {
            registry.add_user(ExternalUser::from_config(user_config))?;
        }

        Ok(registry)
    }

    pub fn add_cluster(&mut self, cluster: Cluster) -> Result<Arc<Cluster>, RegistryError> {
        if self.clusters.contains_key(cluster.name()) {
            return Err(RegistryError::DuplicateCluster(cluster.name().to_string()));
        }
        let cluster = Arc::new(cluster);
        self.clusters.insert(cluster.name().to_string(), cluster.clone());
        Ok(cluster)
    }

    /// Register a user. Its routing target must already exist.
    pub fn add_user(&mut self, user: ExternalUser) -> Result<Arc<ExternalUser>, RegistryError> {
        if self.users.contains_key(&user.name) {
            return Err(RegistryError::DuplicateUser(user.name));
        }

        let Some(cluster) = self.clusters.get(&user.to_cluster) else {
            return Err(RegistryError::UnknownCluster {
                user: user.name,
                cluster: user.to_cluster,
            });
        };
        if cluster.user(&user.to_user).is_none() {
            return Err(RegistryError::UnknownCredential {
                user: user.name,
                cluster: user.to_cluster,
                credential: user.to_user,
            });
        }

        let user = Arc::new(user);
        self.users.insert(user.name.clone(), user.clone());
        Ok(user)
    }

    pub fn cluster(&self, name: &str) -> Option<&Arc<Cluster>> {
        self.clusters.get(name)
    }

    pub fn clusters(&self) -> impl Iterator<Item = &Arc<Cluster>> {
        self.clusters.values()
    }

    pub fn user(&self, name: &str) -> Option<&Arc<ExternalUser>> {
        self.users.get(name)
    }

    pub fn users(&self) -> impl Iterator<Item = &Arc<ExternalUser>> {
        self.users.values()
    }

    /// Resolve a user name to its routing triple.
    pub fn route(&self, user_name: &str) -> Option<Route> {
        let user = self.users.get(user_name)?;
        let cluster = self.clusters.get(&user.to_cluster)?;
        let credential = cluster.user(&user.to_user)?;
        Some(Route {
            user: user.clone(),
            credential: credential.clone(),
            cluster: cluster.clone(),
        })
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut clusters: Vec<_> = self.clusters.values().map(|c| c.snapshot()).collect();
        clusters.sort_by(|a, b| a.name.cmp(&b.name));

        let mut users: Vec<_> = self
            .users
            .values()
            .map(|u| UserSnapshot {
                name: u.name.clone(),
                to_cluster: u.to_cluster.clone(),
                to_user: u.to_user.clone(),
                running_queries: u.running_queries(),
                max_concurrent_queries: u.max_concurrent_queries,
                max_execution_time_secs: u.max_execution_time.as_secs(),
            })
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));

        RegistrySnapshot { clusters, users }
    }
}

fn build_cluster(config: &ClusterConfig) -> Result<Cluster, ClusterError> {
    let credentials = config.users.iter().map(BackendCredential::from_config);
    let mut cluster = Cluster::from_addresses(config.name.clone(), &config.nodes[..], credentials)?;

    if let Some(kill) = &config.kill_query_user {
        let timeout = Duration::from_secs(config.kill_query_timeout_secs);
        cluster = cluster.with_kill_query_user(KillQueryUser::new(
            kill.name.clone(),
            kill.password.clone(),
            timeout,
        )?);
    }

    Ok(cluster)
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrySnapshot {
    pub clusters: Vec<ClusterSnapshot>,
    pub users: Vec<UserSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSnapshot {
    pub name: String,
    pub to_cluster: String,
    pub to_user: String,
    pub running_queries: u32,
    pub max_concurrent_queries: u32,
    pub max_execution_time_secs: u64,
}
