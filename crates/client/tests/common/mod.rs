//! In-process fake of the dashboard API.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Json, State};
use axum::http::{StatusCode, Uri};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};

/// Paths (with query strings) the fake API has received, in order.
#[derive(Clone, Default)]
pub struct RequestLog(Arc<Mutex<Vec<String>>>);

impl RequestLog {
    fn push(&self, uri: &Uri) {
        self.0.lock().unwrap().push(uri.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Bind `router` to an ephemeral port and return its base URL.
pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve test app");
    });
    format!("http://{addr}")
}

/// A base URL nothing is listening on.
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

pub fn history_row(id: i64, image_id: i64, species: &str) -> Value {
    json!({
        "id": id,
        "image_id": image_id,
        "result_species": species,
        "confidence": 0.9,
        "detected_at": "2025-03-01T08:00:00",
        "account_id": 2,
        "account": { "username": "bob" },
        "image": { "annotated_path": format!("public\\annotated\\{image_id}.jpg") }
    })
}

pub fn feedback_row(id: i64, is_correct: bool) -> Value {
    json!({
        "id": id,
        "is_correct": is_correct,
        "comment": "checked",
        "account_id": 2,
        "account": { "username": "bob" },
        "history": { "image_id": 10, "result_species": "Aedes aegypti", "confidence": 0.9 },
        "created_at": "2025-03-01T09:00:00Z"
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn my_history(State(log): State<RequestLog>, uri: Uri) -> Json<Value> {
    log.push(&uri);
    Json(json!([
        history_row(1, 10, "Aedes aegypti"),
        history_row(2, 10, "Culex pipiens"),
    ]))
}

async fn admin_history(State(log): State<RequestLog>, uri: Uri) -> Json<Value> {
    log.push(&uri);
    Json(json!({ "items": [history_row(3, 20, "Anopheles gambiae")], "total": 1 }))
}

async fn history_count(State(log): State<RequestLog>, uri: Uri) -> Json<Value> {
    log.push(&uri);
    Json(json!({ "total": 42 }))
}

async fn object_counts(
    State(log): State<RequestLog>,
    uri: Uri,
    Json(ids): Json<Vec<i64>>,
) -> Json<HashMap<i64, u64>> {
    log.push(&uri);
    Json(ids.into_iter().map(|id| (id, (id as u64) / 10 + 1)).collect())
}

async fn all_feedback(State(log): State<RequestLog>, uri: Uri) -> Json<Value> {
    log.push(&uri);
    Json(json!([feedback_row(1, true), feedback_row(2, false)]))
}

async fn my_feedback(State(log): State<RequestLog>, uri: Uri) -> Json<Value> {
    log.push(&uri);
    Json(json!([feedback_row(3, false)]))
}

async fn feedback_stats(State(log): State<RequestLog>, uri: Uri) -> Json<Value> {
    log.push(&uri);
    Json(json!({ "totalFeedback": 9, "correctFeedback": 5 }))
}

async fn user_feedback(State(log): State<RequestLog>, uri: Uri) -> Json<Value> {
    log.push(&uri);
    Json(json!({ "userFeedbackCount": 3, "lastFeedbackDate": null }))
}

async fn current_user(State(log): State<RequestLog>, uri: Uri) -> Json<Value> {
    log.push(&uri);
    Json(json!({ "id": 2, "username": "bob", "role": "user" }))
}

/// Router answering every endpoint the client uses.
pub fn fake_api(log: RequestLog) -> Router {
    Router::new()
        .route("/history/", get(my_history))
        .route("/history/admin/all", get(admin_history))
        .route("/history/count", get(history_count))
        .route("/history/object-counts", post(object_counts))
        .route("/feedback/all", get(all_feedback))
        .route("/feedback/my-feedback", get(my_feedback))
        .route("/feedback/stats/detailed", get(feedback_stats))
        .route("/feedback/user/{id}", get(user_feedback))
        .route("/auth/me", get(current_user))
        .with_state(log)
}

/// Router answering every request with `status`.
pub fn failing_api(status: StatusCode) -> Router {
    Router::new().fallback(move || async move { (status, "request rejected") })
}

/// Router answering every request with 200 and a body no endpoint expects.
pub fn malformed_api() -> Router {
    Router::new().fallback(|| async { Json(json!({ "oops": 1 })) })
}
