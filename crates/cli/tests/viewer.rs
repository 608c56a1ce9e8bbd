//! End-to-end: environment config -> HTTP source -> screen -> JSON view.

use assert_matches::assert_matches;
use axum::extract::Json;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use entoscope_cli::config::ViewerConfig;
use entoscope_cli::viewer::{self, ViewerError};
use entoscope_core::error::CoreError;
use serde_json::{json, Value};

const TOKEN: &str = "test-token";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

async fn history(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "Not authenticated").into_response();
    }
    Json(json!([
        {
            "id": 1, "image_id": 10, "result_species": "Aedes aegypti", "confidence": 0.9,
            "detected_at": "2025-03-01T08:00:00", "account_id": 2,
            "account": { "username": "bob" }, "image": { "annotated_path": "annotated/10.jpg" }
        },
        {
            "id": 2, "image_id": 10, "result_species": "Culex pipiens", "confidence": 0.7,
            "detected_at": "2025-03-01T08:00:00", "account_id": 2,
            "account": { "username": "bob" }
        }
    ]))
    .into_response()
}

async fn count(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "Not authenticated").into_response();
    }
    Json(json!({ "total": 2 })).into_response()
}

async fn current_user(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "Not authenticated").into_response();
    }
    Json(json!({ "id": 2, "username": "bob" })).into_response()
}

async fn object_counts(Json(_ids): Json<Vec<i64>>) -> Json<Value> {
    Json(json!({ "10": 5 }))
}

async fn spawn_api() -> String {
    let router = Router::new()
        .route("/history/", get(history))
        .route("/history/count", get(count))
        .route("/history/object-counts", post(object_counts))
        .route("/auth/me", get(current_user));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn config(api_url: &str, token: Option<&str>) -> ViewerConfig {
    let api_url = api_url.to_string();
    let token = token.map(str::to_string);
    ViewerConfig::from_lookup(move |key| match key {
        "ENTOSCOPE_API_URL" => Some(api_url.clone()),
        "ENTOSCOPE_API_TOKEN" => token.clone(),
        _ => None,
    })
    .unwrap()
}

#[tokio::test]
async fn renders_cards_for_the_first_page() {
    let api_url = spawn_api().await;

    let view = viewer::run(&config(&api_url, Some(TOKEN)))
        .await
        .expect("query should succeed");

    assert_eq!(view["window"]["page"], 1);
    assert_eq!(view["window"]["total"]["kind"], "server_known");
    assert_eq!(view["window"]["total"]["total_known_items"], 2);
    assert_eq!(view["report"]["backfill"]["status"], "applied");

    let card = &view["cards"][0];
    assert_eq!(card["title"], "Aedes aegypti (+1 more species) (5 objects)");
    assert_eq!(card["owner_label"], "bob");
    assert_eq!(card["confidence_percent"], "90.0%");
    assert_eq!(card["image_url"], format!("{api_url}/public/annotated/10.jpg"));
}

#[tokio::test]
async fn missing_token_surfaces_auth_error() {
    let api_url = spawn_api().await;

    let result = viewer::run(&config(&api_url, None)).await;

    assert_matches!(result, Err(ViewerError::Query(CoreError::Auth(_))));
}
