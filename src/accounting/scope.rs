//! Per-request admission scope.
//!
//! # Responsibilities
//! - Bind a request to its user, backend credential, cluster and node
//! - Increment all three counters on admission, enforce ceilings
//! - Decrement all three counters exactly once when the request ends

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::accounting::identity::{exceeds, BackendCredential, ExternalUser};
use crate::cluster::{Cluster, KillError, Node};

/// Diagnostic id source; wraps freely, never used as an accounting key.
static SCOPE_ID: LazyLock<AtomicU32> = LazyLock::new(|| {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u32)
        .unwrap_or(0);
    AtomicU32::new(seed)
});

fn next_scope_id() -> u32 {
    SCOPE_ID.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
}

/// Which identity hit its ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitedEntity {
    User,
    Credential,
}

impl fmt::Display for LimitedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitedEntity::User => write!(f, "user"),
            LimitedEntity::Credential => write!(f, "cluster user"),
        }
    }
}

/// Admission failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmitError {
    #[error("limits for {entity} {name:?} are exceeded: max_concurrent_queries limit: {ceiling}")]
    LimitExceeded {
        entity: LimitedEntity,
        name: String,
        ceiling: u32,
    },
}

/// An admitted request.
///
/// Holds one unit on the node, user and credential counters. Dropping the
/// scope gives all three back, so every exit path of the owning request
/// releases it exactly once.
#[derive(Debug)]
pub struct Scope {
    id: u32,
    node: usize,
    cluster: Arc<Cluster>,
    user: Arc<ExternalUser>,
    credential: Arc<BackendCredential>,
}

impl Scope {
    /// Pick a node from `cluster` and account the request against it, the
    /// user and the credential.
    ///
    /// Counters are incremented before ceilings are checked, so concurrent
    /// callers can briefly push a count past its ceiling. Every caller that
    /// observes an overshoot rolls its own increments back before returning.
    pub fn admit(
        user: &Arc<ExternalUser>,
        credential: &Arc<BackendCredential>,
        cluster: &Arc<Cluster>,
    ) -> Result<Self, AdmitError> {
        let node = cluster.select_index();
        cluster.nodes()[node].counter.increment();
        let uq = user.counter.increment();
        let cq = credential.counter.increment();

        let scope = Self {
            id: next_scope_id(),
            node,
            cluster: cluster.clone(),
            user: user.clone(),
            credential: credential.clone(),
        };

        let mut err = None;
        if exceeds(uq, user.max_concurrent_queries) {
            err = Some(AdmitError::LimitExceeded {
                entity: LimitedEntity::User,
                name: user.name.clone(),
                ceiling: user.max_concurrent_queries,
            });
        }
        if exceeds(cq, credential.max_concurrent_queries) {
            err = Some(AdmitError::LimitExceeded {
                entity: LimitedEntity::Credential,
                name: credential.name.clone(),
                ceiling: credential.max_concurrent_queries,
            });
        }

        if let Some(err) = err {
            tracing::debug!(scope = %scope, error = %err, "Admission rejected");
            // rolls back node, user and credential
            drop(scope);
            return Err(err);
        }

        Ok(scope)
    }

    /// End the request. Equivalent to dropping the scope.
    pub fn release(self) {
        drop(self);
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn node(&self) -> &Node {
        &self.cluster.nodes()[self.node]
    }

    pub fn cluster(&self) -> &Arc<Cluster> {
        &self.cluster
    }

    pub fn user(&self) -> &Arc<ExternalUser> {
        &self.user
    }

    pub fn credential(&self) -> &Arc<BackendCredential> {
        &self.credential
    }

    /// Tightest non-zero execution-time budget of the user and credential.
    pub fn max_execution_time(&self) -> Option<Duration> {
        [self.user.max_execution_time, self.credential.max_execution_time]
            .into_iter()
            .filter(|d| !d.is_zero())
            .min()
    }

    /// Kill this request's queries on every node of its cluster.
    pub async fn kill_queries(&self, client_tag: &str, elapsed: Duration) -> Result<(), KillError> {
        self.cluster.kill_queries(client_tag, elapsed).await
    }

    /// Human-readable correlation string with live counts.
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.node();
        write!(
            f,
            "[ Id: {}; User {:?}({}) proxying as {:?}({}) to {:?}({}) ]",
            self.id,
            self.user.name,
            self.user.running_queries(),
            self.credential.name,
            self.credential.running_queries(),
            node.host(),
            node.running_queries(),
        )
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.cluster.nodes()[self.node].counter.decrement();
        self.user.counter.decrement();
        self.credential.counter.decrement();
    }
}
