use std::time::Duration;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::cluster::ClusterSnapshot;
use crate::registry::UserSnapshot;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub clusters: usize,
    pub users: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KillRequest {
    pub cluster: String,
    pub client_tag: String,
    pub elapsed_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KillResponse {
    pub cluster: String,
    pub nodes: usize,
    pub kill_queries_enabled: bool,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        clusters: state.registry.clusters().count(),
        users: state.registry.users().count(),
    })
}

pub async fn get_clusters(State(state): State<AdminState>) -> Json<Vec<ClusterSnapshot>> {
    Json(state.registry.snapshot().clusters)
}

pub async fn get_users(State(state): State<AdminState>) -> Json<Vec<UserSnapshot>> {
    Json(state.registry.snapshot().users)
}

pub async fn post_kill(
    State(state): State<AdminState>,
    Json(req): Json<KillRequest>,
) -> Result<Json<KillResponse>, (StatusCode, String)> {
    let Some(cluster) = state.registry.cluster(&req.cluster) else {
        return Err((StatusCode::NOT_FOUND, format!("unknown cluster {:?}", req.cluster)));
    };

    cluster
        .kill_queries(&req.client_tag, Duration::from_secs(req.elapsed_secs))
        .await
        .map_err(|e| {
            tracing::warn!(cluster = %req.cluster, error = %e, "Manual kill query failed");
            (StatusCode::BAD_GATEWAY, e.to_string())
        })?;

    Ok(Json(KillResponse {
        cluster: req.cluster,
        nodes: cluster.current_node_count(),
        kill_queries_enabled: cluster.kill_query_user().is_some(),
    }))
}
