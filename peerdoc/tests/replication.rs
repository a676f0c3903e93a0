use std::{net::SocketAddr, sync::Arc, time::Duration};

use peerdoc::{
    backend::StoreBackend,
    memory::InMemoryStore,
    node,
    replication::{PropagationReport, Replicator},
    server::AppState,
};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tokio::{net::TcpListener, sync::mpsc};

struct TestNode {
    addr: SocketAddr,
    reports: mpsc::UnboundedReceiver<PropagationReport>,
}

impl TestNode {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn next_report(&mut self) -> PropagationReport {
        tokio::time::timeout(Duration::from_secs(10), self.reports.recv())
            .await
            .expect("replication did not finish in time")
            .expect("replicator dropped")
    }
}

async fn bind() -> TcpListener {
    TcpListener::bind("127.0.0.1:0").await.unwrap()
}

fn start(listener: TcpListener, peers: Vec<String>) -> TestNode {
    let addr = listener.local_addr().unwrap();
    let (tx, reports) = mpsc::unbounded_channel();

    let backend: Arc<dyn StoreBackend> = Arc::new(InMemoryStore::new());
    let replicator = Replicator::http(peers, Some(Duration::from_secs(2)))
        .unwrap()
        .with_completion_hook(move |report| {
            let _ = tx.send(report);
        });

    tokio::spawn(node::serve(listener, AppState::new(backend, replicator)));

    TestNode { addr, reports }
}

async fn pair() -> (TestNode, TestNode) {
    let (listener_a, listener_b) = (bind().await, bind().await);
    let (addr_a, addr_b) = (listener_a.local_addr().unwrap(), listener_b.local_addr().unwrap());

    (
        start(listener_a, vec![addr_b.to_string()]),
        start(listener_b, vec![addr_a.to_string()]),
    )
}

fn client() -> Client {
    Client::builder().no_proxy().build().unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn changes_propagate_between_two_nodes() {
    let (mut a, mut b) = pair().await;
    let http = client();

    // create on A
    let created: Value = http
        .post(a.url("/acme/users/document"))
        .json(&json!({ "name": "Alice", "age": 30 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["_id"].as_str().unwrap().to_string();
    assert_eq!(created["created_at"], created["updated_at"]);

    let report = a.next_report().await;
    assert!(report.delivered);
    assert_eq!(report.attempts, 1);

    let on_b: Value = http
        .get(b.url(&format!("/acme/users/document/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(on_b["data"], json!({ "name": "Alice", "age": 30 }));
    assert_eq!(on_b["created_at"], created["created_at"]);

    // update on B
    let response = http
        .put(b.url(&format!("/acme/users/document/{id}")))
        .json(&json!({ "name": "Alice", "age": 31 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(b.next_report().await.delivered);

    let on_a: Value = http
        .get(a.url(&format!("/acme/users/document/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(on_a["data"]["age"], 31);

    let adults: Value = http
        .post(a.url("/acme/users/query"))
        .json(&json!({ "age": { "$gte": 18 } }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(adults["count"], 1);

    // delete on A
    let response = http
        .delete(a.url(&format!("/acme/users/document/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(a.next_report().await.delivered);

    let response = http
        .get(b.url(&format!("/acme/users/document/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unreachable_peer_does_not_fail_the_write() {
    let dead = bind().await;
    let dead_addr = dead.local_addr().unwrap();
    drop(dead);

    let mut node = start(bind().await, vec![dead_addr.to_string()]);
    let http = client();

    let response = http
        .post(node.url("/acme/users/document"))
        .json(&json!({ "name": "Alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let listed: Value = http
        .get(node.url("/acme/users/document"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["documents"].as_array().unwrap().len(), 1);

    // default schedule: 1s + 2s + 3s of backoff
    let report = tokio::time::timeout(Duration::from_secs(15), node.reports.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(!report.delivered);
    assert_eq!(report.attempts, 3);
}

#[tokio::test]
async fn http_errors_follow_the_store_taxonomy() {
    let node = start(bind().await, Vec::new());
    let http = client();

    let status = |response: reqwest::Response| response.status();

    assert_eq!(
        status(http.get(node.url("/acme/users/document")).send().await.unwrap()),
        StatusCode::NOT_FOUND
    );

    assert_eq!(status(http.post(node.url("/acme")).send().await.unwrap()), StatusCode::CREATED);
    assert_eq!(status(http.post(node.url("/acme")).send().await.unwrap()), StatusCode::CONFLICT);
    assert_eq!(status(http.post(node.url("/acme/users")).send().await.unwrap()), StatusCode::CREATED);
    assert_eq!(status(http.post(node.url("/acme/users")).send().await.unwrap()), StatusCode::CONFLICT);
    assert_eq!(
        status(http.post(node.url("/nope/users")).send().await.unwrap()),
        StatusCode::NOT_FOUND
    );

    assert_eq!(
        status(
            http.post(node.url("/acme/users/document"))
                .json(&json!([1, 2, 3]))
                .send()
                .await
                .unwrap()
        ),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status(
            http.post(node.url("/acme/users/query"))
                .json(&json!({ "$bogus": 1 }))
                .send()
                .await
                .unwrap()
        ),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status(http.delete(node.url("/acme/users/document/ghost")).send().await.unwrap()),
        StatusCode::NOT_FOUND
    );

    let everything: Value = http
        .post(node.url("/acme/users/query"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(everything["count"], 0);

    let projects: Value = http.get(node.url("/")).send().await.unwrap().json().await.unwrap();
    assert_eq!(projects["projects"], json!(["acme"]));
    let collections: Value = http.get(node.url("/acme")).send().await.unwrap().json().await.unwrap();
    assert_eq!(collections["collections"], json!(["users"]));
}

#[tokio::test]
async fn replicate_endpoint_validates_payloads() {
    let node = start(bind().await, Vec::new());
    let http = client();

    let response = http
        .post(node.url("/replicate"))
        .json(&json!({ "project": "acme", "collection": "users", "data": {} }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = http
        .post(node.url("/replicate"))
        .json(&json!({ "project": "acme", "collection": "users", "id": "doc-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = http
        .post(node.url("/replicate"))
        .json(&json!({ "project": "acme", "collection": "users", "id": "doc-1", "data": { "n": 1 } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = http
        .post(node.url("/replicate"))
        .json(&json!({ "project": "acme", "collection": "users", "id": "ghost", "operation": "delete" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let doc: Value = http
        .get(node.url("/acme/users/document/doc-1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(doc["data"], json!({ "n": 1 }));
}
