use std::sync::Arc;

use portal_client::{
    AuthenticatedClient, ClientConfig, ClientContext, ClientError, CredentialStore, HttpClient,
    MemoryCredentialStore, OutboundRequest, RecordingNavigator,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    server: MockServer,
    store: Arc<MemoryCredentialStore>,
    nav: Arc<RecordingNavigator>,
    client: AuthenticatedClient,
}

async fn harness(token: Option<&str>) -> Harness {
    let server = MockServer::start().await;
    let store = Arc::new(match token {
        Some(t) => MemoryCredentialStore::with_token(t),
        None => MemoryCredentialStore::new(),
    });
    let nav = Arc::new(RecordingNavigator::new());
    let config = ClientConfig::new().with_base_url(format!("{}/api", server.uri()));
    let client =
        AuthenticatedClient::new(&config, ClientContext::new(store.clone(), nav.clone())).unwrap();

    Harness {
        server,
        store,
        nav,
        client,
    }
}

#[tokio::test]
async fn attaches_bearer_token_when_logged_in() {
    let h = harness(Some("T")).await;

    Mock::given(method("GET"))
        .and(path("/api/clients"))
        .and(header("Authorization", "Bearer T"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&h.server)
        .await;

    let resp = h.client.get("/clients").await.unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.data, json!({"data": []}));
}

#[tokio::test]
async fn omits_authorization_when_logged_out() {
    let h = harness(None).await;

    Mock::given(method("GET"))
        .and(path("/api/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&h.server)
        .await;

    h.client.get("/services").await.unwrap();

    let requests = h.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn unauthorized_purges_credential_and_redirects_for_any_path() {
    for target in ["/clients", "/projects/42/milestones", "/tickets"] {
        let h = harness(Some("stale")).await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
            .mount(&h.server)
            .await;

        let err = h.client.get(target).await.unwrap_err();
        assert!(err.is_unauthorized(), "{target}: {err}");
        assert_eq!(h.store.load().unwrap(), None);
        assert_eq!(h.nav.routes(), vec!["/client-login"]);
    }
}

#[tokio::test]
async fn non_401_failures_pass_through_untouched() {
    let h = harness(Some("T")).await;

    Mock::given(method("POST"))
        .and(path("/api/withdrawals"))
        .respond_with(ResponseTemplate::new(500).set_body_string("ledger offline"))
        .mount(&h.server)
        .await;

    let err = h
        .client
        .post("/withdrawals", json!({"amount": 100}))
        .await
        .unwrap_err();

    match err {
        ClientError::Http { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "ledger offline");
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }
    assert_eq!(h.store.load().unwrap().as_deref(), Some("T"));
    assert!(h.nav.routes().is_empty());
}

#[tokio::test]
async fn forbidden_is_not_treated_as_logout() {
    let h = harness(Some("T")).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&h.server)
        .await;

    let err = h.client.get("/admin/partners").await.unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert_eq!(h.store.load().unwrap().as_deref(), Some("T"));
    assert!(h.nav.routes().is_empty());
}

#[tokio::test]
async fn sends_query_and_json_body() {
    let h = harness(Some("T")).await;

    Mock::given(method("PUT"))
        .and(path("/api/leads/9"))
        .and(query_param("notify", "true"))
        .and(body_json(json!({"status": "quoted"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 9, "status": "quoted"})))
        .expect(1)
        .mount(&h.server)
        .await;

    let request = OutboundRequest::put("/leads/9", json!({"status": "quoted"})).with_query("notify", "true");
    let resp = h.client.send(request).await.unwrap();
    assert_eq!(resp.data["status"], "quoted");
}

#[tokio::test]
async fn empty_success_body_is_null() {
    let h = harness(Some("T")).await;

    Mock::given(method("DELETE"))
        .and(path("/api/tickets/3"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&h.server)
        .await;

    let resp = h.client.delete("/tickets/3").await.unwrap();
    assert_eq!(resp.status, 204);
    assert!(resp.data.is_null());
}

#[tokio::test]
async fn network_failure_surfaces_as_network_error() {
    let store = Arc::new(MemoryCredentialStore::with_token("T"));
    let nav = Arc::new(RecordingNavigator::new());
    // Port 9 (discard) on localhost is not expected to accept HTTP.
    let config = ClientConfig::new().with_base_url("http://127.0.0.1:9/api");
    let client = AuthenticatedClient::new(&config, ClientContext::new(store.clone(), nav.clone())).unwrap();

    let err = client.get("/clients").await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)), "{err:?}");
    assert_eq!(store.load().unwrap().as_deref(), Some("T"));
    assert!(nav.routes().is_empty());
}

#[tokio::test]
async fn end_to_end_login_then_session_expiry() {
    let h = harness(None).await;
    h.store.store("abc123").unwrap();

    Mock::given(method("GET"))
        .and(path("/api/clients"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h.client.get("/clients").await.unwrap_err();
    assert!(err.is_unauthorized());

    let requests = h.server.received_requests().await.unwrap();
    assert_eq!(
        requests[0].headers.get("authorization").unwrap(),
        "Bearer abc123"
    );
    assert_eq!(h.store.load().unwrap(), None);
    assert_eq!(h.nav.last().as_deref(), Some("/client-login"));
}

#[tokio::test]
async fn sub_second_timeout_applies_to_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/clients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/reports"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": []}))
                .set_delay(std::time::Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = ClientConfig::new()
        .with_base_url(format!("{}/api", server.uri()))
        .with_timeout(std::time::Duration::from_millis(500));
    let ctx = ClientContext::new(
        Arc::new(MemoryCredentialStore::with_token("T")),
        Arc::new(RecordingNavigator::new()),
    );
    let client = AuthenticatedClient::new(&config, ctx).unwrap();

    let resp = client.get("/clients").await.unwrap();
    assert_eq!(resp.status, 200);

    let err = client.get("/reports").await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)), "got {err:?}");
}
