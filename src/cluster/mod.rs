//! Backend cluster subsystem.
//!
//! # Data Flow
//! ```text
//! ClusterConfig
//!     → node.rs (one Node per configured address, in order)
//!     → BackendCredential per cluster user
//!     → kill.rs (optional kill-query user + HTTP client)
//!     → Cluster (immutable apart from counters and the cursor)
//!
//! Per request:
//!     → select.rs (round-robin start, least-loaded scan)
//!
//! On execution-time overrun:
//!     → kill.rs (KILL QUERY posted to every node)
//! ```
//!
//! # Design Decisions
//! - Node list is fixed at construction and never empty
//! - The round-robin cursor is a single atomic per cluster
//! - Nodes are ranked, never rejected

pub mod kill;
pub mod node;
pub mod select;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use thiserror::Error;

use crate::accounting::BackendCredential;

pub use kill::{KillError, KillQueryUser};
pub use node::Node;

/// Errors raised while assembling a cluster.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("cluster must have at least one node")]
    NoNodes,

    #[error("invalid node address {address:?}: {source}")]
    InvalidNodeAddress {
        address: String,
        #[source]
        source: url::ParseError,
    },

    #[error("duplicate cluster user {0:?}")]
    DuplicateCredential(String),

    #[error("failed to build kill-query HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// A set of backend nodes sharing a credential namespace.
#[derive(Debug)]
pub struct Cluster {
    name: String,
    next_idx: AtomicUsize,
    nodes: Vec<Node>,
    users: HashMap<String, Arc<BackendCredential>>,
    kill_query_user: Option<KillQueryUser>,
}

impl Cluster {
    /// Create a cluster from its nodes and backend credentials.
    ///
    /// The round-robin cursor is seeded from the clock so that restarted
    /// proxies do not all begin on the first node.
    pub fn new(
        name: impl Into<String>,
        nodes: Vec<Node>,
        users: impl IntoIterator<Item = BackendCredential>,
    ) -> Result<Self, ClusterError> {
        if nodes.is_empty() {
            return Err(ClusterError::NoNodes);
        }

        let mut by_name = HashMap::new();
        for user in users {
            match by_name.entry(user.name.clone()) {
                Entry::Occupied(_) => return Err(ClusterError::DuplicateCredential(user.name)),
                Entry::Vacant(slot) => {
                    slot.insert(Arc::new(user));
                }
            }
        }

        Ok(Self {
            name: name.into(),
            next_idx: AtomicUsize::new(clock_seed()),
            nodes,
            users: by_name,
            kill_query_user: None,
        })
    }

    /// Create a cluster from node address strings.
    pub fn from_addresses<S: AsRef<str>>(
        name: impl Into<String>,
        addresses: &[S],
        users: impl IntoIterator<Item = BackendCredential>,
    ) -> Result<Self, ClusterError> {
        let nodes = addresses
            .iter()
            .map(|a| {
                Node::parse(a.as_ref()).map_err(|source| ClusterError::InvalidNodeAddress {
                    address: a.as_ref().to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(name, nodes, users)
    }

    /// Enable the kill-query protocol for this cluster.
    pub fn with_kill_query_user(mut self, user: KillQueryUser) -> Self {
        self.kill_query_user = Some(user);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn current_node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Look up a backend credential by name.
    pub fn user(&self, name: &str) -> Option<&Arc<BackendCredential>> {
        self.users.get(name)
    }

    pub fn kill_query_user(&self) -> Option<&KillQueryUser> {
        self.kill_query_user.as_ref()
    }

    /// Select the node that should serve the next query.
    pub fn select_node(&self) -> &Node {
        &self.nodes[self.select_index()]
    }

    pub(crate) fn select_index(&self) -> usize {
        select::least_loaded(&self.nodes, &self.next_idx)
    }

    /// Point-in-time view of live counts.
    pub fn snapshot(&self) -> ClusterSnapshot {
        let mut credentials: Vec<_> = self
            .users
            .values()
            .map(|u| CredentialSnapshot {
                name: u.name.clone(),
                running_queries: u.running_queries(),
                max_concurrent_queries: u.max_concurrent_queries,
                max_execution_time_secs: u.max_execution_time.as_secs(),
            })
            .collect();
        credentials.sort_by(|a, b| a.name.cmp(&b.name));

        ClusterSnapshot {
            name: self.name.clone(),
            nodes: self
                .nodes
                .iter()
                .map(|n| NodeSnapshot {
                    address: n.addr.to_string(),
                    running_queries: n.running_queries(),
                })
                .collect(),
            credentials,
            kill_queries_enabled: self.kill_query_user.is_some(),
        }
    }
}

fn clock_seed() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as usize)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterSnapshot {
    pub name: String,
    pub nodes: Vec<NodeSnapshot>,
    pub credentials: Vec<CredentialSnapshot>,
    pub kill_queries_enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub address: String,
    pub running_queries: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CredentialSnapshot {
    pub name: String,
    pub running_queries: u32,
    pub max_concurrent_queries: u32,
    pub max_execution_time_secs: u64,
}
