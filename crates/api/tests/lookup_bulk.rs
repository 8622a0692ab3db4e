use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use pronouns_api::{LookupError, PronounDbClient, PronounLookup, SOURCE_HEADER};
use pronouns_types::Platform;

#[derive(Clone, Default)]
struct Recorded {
    requests: Arc<Mutex<Vec<(HashMap<String, String>, Option<String>)>>>,
}

async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{}", address)
}

async fn echo_lookup(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<HashMap<String, String>> {
    let source = headers
        .get(SOURCE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    recorded.requests.lock().unwrap().push((params.clone(), source));

    let response = params
        .get("ids")
        .map(|ids| {
            ids.split(',')
                .filter(|id| *id != "missing")
                .map(|id| (id.to_string(), "tt".to_string()))
                .collect()
        })
        .unwrap_or_default();
    Json(response)
}

#[tokio::test]
async fn lookup_bulk_sends_one_request_with_all_ids() {
    let recorded = Recorded::default();
    let router = Router::new()
        .route("/api/v1/lookup-bulk", get(echo_lookup))
        .with_state(recorded.clone());
    let base_url = spawn_server(router).await;

    let client = PronounDbClient::new(&base_url, "integration-test".into()).unwrap();
    let ids = vec!["10".to_string(), "missing".to_string(), "20".to_string()];
    let response = client.lookup_bulk(&ids).await.unwrap();

    assert_eq!(response.len(), 2);
    assert_eq!(response.get("10").map(String::as_str), Some("tt"));
    assert!(!response.contains_key("missing"));

    let requests = recorded.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (params, source) = &requests[0];
    assert_eq!(params.get("platform").map(String::as_str), Some("discord"));
    assert_eq!(params.get("ids").map(String::as_str), Some("10,missing,20"));
    assert_eq!(source.as_deref(), Some("integration-test"));
}

#[tokio::test]
async fn lookup_bulk_uses_configured_platform() {
    let recorded = Recorded::default();
    let router = Router::new()
        .route("/api/v1/lookup-bulk", get(echo_lookup))
        .with_state(recorded.clone());
    let base_url = spawn_server(router).await;

    let client = PronounDbClient::new(&base_url, "integration-test".into())
        .unwrap()
        .with_platform(Platform::Github);
    client.lookup_bulk(&["octocat".to_string()]).await.unwrap();

    let requests = recorded.requests.lock().unwrap();
    assert_eq!(requests[0].0.get("platform").map(String::as_str), Some("github"));
}

#[tokio::test]
async fn non_success_status_is_a_status_error() {
    let router = Router::new().route(
        "/api/v1/lookup-bulk",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "try later") }),
    );
    let base_url = spawn_server(router).await;

    let client = PronounDbClient::new(&base_url, "integration-test".into()).unwrap();
    let error = client.lookup_bulk(&["1".to_string()]).await.unwrap_err();

    match error {
        LookupError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "try later");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let router = Router::new().route("/api/v1/lookup-bulk", get(|| async { "<html>nope</html>" }));
    let base_url = spawn_server(router).await;

    let client = PronounDbClient::new(&base_url, "integration-test".into()).unwrap();
    let error = client.lookup_bulk(&["1".to_string()]).await.unwrap_err();

    assert!(matches!(error, LookupError::Decode(_)), "got {error:?}");
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let client = PronounDbClient::new(&format!("http://{}", address), "integration-test".into()).unwrap();
    let error = client.lookup_bulk(&["1".to_string()]).await.unwrap_err();

    assert!(matches!(error, LookupError::Transport(_)), "got {error:?}");
}
