//! End-to-end tests for the expired-token refresh flow against a local mock
//! of the storefront API.
//!
//! The mock serves `/api/cart` only to requests carrying the fresh access
//! cookie and answers everything else with the distinguished expired-token
//! 401, so each test can observe exactly how many refresh calls the client
//! issued.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;

use clover_client::ApiClient;

const FRESH_TOKEN: &str = "fresh-token";

#[derive(Clone)]
struct MockState {
    refresh_calls: Arc<AtomicUsize>,
}

fn has_fresh_cookie(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|cookies| cookies.contains(&format!("access_token={FRESH_TOKEN}")))
}

async fn cart(State(_): State<MockState>, headers: HeaderMap) -> impl IntoResponse {
    if has_fresh_cookie(&headers) {
        (StatusCode::OK, Json(json!([]))).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "message": "Access token expired",
                "code": "ACCESS_TOKEN_EXPIRED",
            })),
        )
            .into_response()
    }
}

async fn refresh(State(state): State<MockState>) -> impl IntoResponse {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    (
        [(
            header::SET_COOKIE,
            format!("access_token={FRESH_TOKEN}; Path=/"),
        )],
        Json(json!({
            "accessToken": FRESH_TOKEN,
            "message": "Access token refreshed successfully",
        })),
    )
}

async fn profile() -> impl IntoResponse {
    // A plain 401 without the expired-token code: must NOT trigger a refresh.
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "No access token provided" })),
    )
}

async fn spawn_mock() -> (String, Arc<AtomicUsize>) {
    let refresh_calls = Arc::new(AtomicUsize::new(0));
    let state = MockState {
        refresh_calls: Arc::clone(&refresh_calls),
    };

    let app = Router::new()
        .route("/api/cart", get(cart))
        .route("/api/auth/refresh-token", post(refresh))
        .route("/api/auth/profile", get(profile))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock listener");
    let addr = listener.local_addr().expect("mock listener addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });

    (format!("http://{addr}"), refresh_calls)
}

#[tokio::test]
async fn expired_token_refreshes_once_and_retries() {
    let (base_url, refresh_calls) = spawn_mock().await;
    let client = ApiClient::new(&base_url).expect("build client");

    let items = client.cart().await.expect("cart after refresh");

    assert!(items.is_empty());
    assert_eq!(refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_requests_share_a_single_refresh() {
    let (base_url, refresh_calls) = spawn_mock().await;
    let client = Arc::new(ApiClient::new(&base_url).expect("build client"));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let client = Arc::clone(&client);
        handles.push(tokio::spawn(async move { client.cart().await }));
    }

    for handle in handles {
        handle.await.expect("join").expect("cart request");
    }

    assert_eq!(refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn plain_unauthorized_does_not_refresh() {
    let (base_url, refresh_calls) = spawn_mock().await;
    let client = ApiClient::new(&base_url).expect("build client");

    let err = client.profile().await.expect_err("signed out");

    match err {
        clover_client::ClientError::Api { status, code, .. } => {
            assert_eq!(status, 401);
            assert_eq!(code, None);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(refresh_calls.load(Ordering::SeqCst), 0);
}
