//! Out-of-band query termination.
//!
//! # Responsibilities
//! - Build the administrative `KILL QUERY` statement
//! - Post it to every node of a cluster with the kill-query credential
//! - Report the first node that refuses it
//!
//! # Design Decisions
//! - Queries are matched on the client tag (`http_user_agent`) rather than
//!   `query_id`: distributed queries fan out to nodes that never see the
//!   original id, but the tag travels with every outbound request
//! - Nodes are contacted sequentially; the first failure aborts the call
//! - Kill capability is opt-in per cluster

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::cluster::Cluster;

/// Client-side timeout applied to kill requests unless configured otherwise.
pub const DEFAULT_KILL_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors raised while killing queries on a cluster.
#[derive(Debug, Error)]
pub enum KillError {
    /// The HTTP request could not be built.
    #[error("error while creating kill query request to {node}: {source}")]
    RequestConstructionFailed {
        node: String,
        #[source]
        source: reqwest::Error,
    },

    /// The node did not accept the request or did not answer in time.
    #[error("error while executing kill query at {node}: {source}")]
    TransportError {
        node: String,
        #[source]
        source: reqwest::Error,
    },

    /// The node answered with something other than 200 OK.
    #[error("unexpected status code returned from kill query at {node}: {code}. Response body: {body:?}")]
    UnexpectedStatus { node: String, code: u16, body: String },
}

impl KillError {
    /// Address of the node that failed.
    pub fn node(&self) -> &str {
        match self {
            KillError::RequestConstructionFailed { node, .. }
            | KillError::TransportError { node, .. }
            | KillError::UnexpectedStatus { node, .. } => node,
        }
    }
}

/// Credential used to issue kill statements, with its own HTTP client.
#[derive(Clone)]
pub struct KillQueryUser {
    pub name: String,
    password: String,
    client: reqwest::Client,
}

impl KillQueryUser {
    pub fn new(
        name: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()?;
        Ok(Self {
            name: name.into(),
            password: password.into(),
            client,
        })
    }
}

impl fmt::Debug for KillQueryUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KillQueryUser")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Statement killing every query tagged `client_tag` that has run for at
/// least `elapsed` (whole seconds).
pub fn kill_statement(client_tag: &str, elapsed: Duration) -> String {
    format!(
        "KILL QUERY WHERE http_user_agent = '{}' AND elapsed >= {}",
        escape_literal(client_tag),
        elapsed.as_secs()
    )
}

fn escape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '\\' || c == '\'' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl Cluster {
    /// Ask every node to terminate queries tagged `client_tag` that have been
    /// running for at least `elapsed`.
    ///
    /// A no-op when the cluster has no kill-query user. Stops at the first
    /// node that fails; later nodes are not contacted.
    pub async fn kill_queries(&self, client_tag: &str, elapsed: Duration) -> Result<(), KillError> {
        let Some(kill) = self.kill_query_user() else {
            return Ok(());
        };

        let query = kill_statement(client_tag, elapsed);
        tracing::debug!(cluster = %self.name(), query = %query, "Killing queries on every node");

        for node in self.nodes() {
            let addr = node.addr.to_string();

            let request = kill
                .client
                .post(node.addr.clone())
                .basic_auth(&kill.name, Some(&kill.password))
                .body(query.clone())
                .build()
                .map_err(|source| KillError::RequestConstructionFailed {
                    node: addr.clone(),
                    source,
                })?;

            let response = kill.client.execute(request).await.map_err(|source| {
                tracing::warn!(node = %addr, error = %source, "Kill query failed: transport error");
                KillError::TransportError {
                    node: addr.clone(),
                    source,
                }
            })?;

            let status = response.status();
            if status != StatusCode::OK {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(node = %addr, status = %status, "Kill query failed: unexpected status");
                return Err(KillError::UnexpectedStatus {
                    node: addr,
                    code: status.as_u16(),
                    body,
                });
            }
        }

        Ok(())
    }
}
