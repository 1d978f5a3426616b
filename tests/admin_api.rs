//! Admin API end to end.

use std::sync::Arc;

use query_proxy::admin::{self, AdminState};
use query_proxy::config::loader::parse_config;
use query_proxy::registry::Registry;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

mod common;

const API_KEY: &str = "test-admin-key";

struct Running {
    base: String,
    registry: Arc<Registry>,
    _shutdown: oneshot::Sender<()>,
}

async fn start_admin(node_urls: &[String]) -> Running {
    let nodes = node_urls
        .iter()
        .map(|u| format!("{:?}", u))
        .collect::<Vec<_>>()
        .join(", ");
    let config = parse_config(&format!(
        r#"
        [[clusters]]
        name = "olap"
        nodes = [{nodes}]
        kill_query_user = {{ name = "killer", password = "pw" }}
        users = [{{ name = "default", max_concurrent_queries = 4 }}]

        [[users]]
        name = "web"
        to_cluster = "olap"
        to_user = "default"
        max_concurrent_queries = 2
        "#
    ))
    .unwrap();
    let registry = Arc::new(Registry::from_config(&config).unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = oneshot::channel::<()>();
    let state = AdminState::new(registry.clone(), API_KEY);
    tokio::spawn(async move {
        let _ = admin::serve(listener, state, async move {
            let _ = rx.await;
        })
        .await;
    });

    Running {
        base,
        registry,
        _shutdown: tx,
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

#[tokio::test]
async fn test_requires_bearer_token() {
    let node = common::start_status_backend(200, "").await;
    let admin = start_admin(&[node.url()]).await;

    let res = client()
        .get(format!("{}/admin/status", admin.base))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let res = client()
        .get(format!("{}/admin/status", admin.base))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let res = client()
        .get(format!("{}/admin/status", admin.base))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "operational");
    assert_eq!(body["clusters"], 1);
    assert_eq!(body["users"], 1);
}

#[tokio::test]
async fn test_snapshots_show_live_counts() {
    let node = common::start_status_backend(200, "").await;
    let admin = start_admin(&[node.url()]).await;

    let scope = admin.registry.route("web").unwrap().admit().unwrap();

    let clusters: Value = client()
        .get(format!("{}/admin/clusters", admin.base))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(clusters[0]["name"], "olap");
    assert_eq!(clusters[0]["nodes"][0]["running_queries"], 1);
    assert_eq!(clusters[0]["credentials"][0]["running_queries"], 1);
    assert_eq!(clusters[0]["credentials"][0]["max_concurrent_queries"], 4);
    assert_eq!(clusters[0]["kill_queries_enabled"], true);

    drop(scope);

    let users: Value = client()
        .get(format!("{}/admin/users", admin.base))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users[0]["name"], "web");
    assert_eq!(users[0]["running_queries"], 0);
    assert_eq!(users[0]["max_concurrent_queries"], 2);
}

#[tokio::test]
async fn test_manual_kill() {
    let node1 = common::start_status_backend(200, "").await;
    let node2 = common::start_status_backend(200, "").await;
    let admin = start_admin(&[node1.url(), node2.url()]).await;

    let res = client()
        .post(format!("{}/admin/kill", admin.base))
        .bearer_auth(API_KEY)
        .json(&json!({ "cluster": "olap", "client_tag": "req-7", "elapsed_secs": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["nodes"], 2);

    for node in [&node1, &node2] {
        let received = node.received();
        assert_eq!(received.len(), 1);
        assert_eq!(
            received[0].body,
            "KILL QUERY WHERE http_user_agent = 'req-7' AND elapsed >= 3"
        );
    }
}

#[tokio::test]
async fn test_manual_kill_errors() {
    let bad = common::start_status_backend(503, "overloaded").await;
    let admin = start_admin(&[bad.url()]).await;

    let res = client()
        .post(format!("{}/admin/kill", admin.base))
        .bearer_auth(API_KEY)
        .json(&json!({ "cluster": "missing", "client_tag": "t", "elapsed_secs": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    let res = client()
        .post(format!("{}/admin/kill", admin.base))
        .bearer_auth(API_KEY)
        .json(&json!({ "cluster": "olap", "client_tag": "t", "elapsed_secs": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 502);
    let text = res.text().await.unwrap();
    assert!(text.contains("503"));
    assert!(text.contains(&bad.url()));
}
