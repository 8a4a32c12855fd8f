#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use shuxue_backend_rust::config::Config;
use shuxue_backend_rust::seed::builtin_catalog;

pub fn create_test_app() -> Router {
    create_test_app_with(Config {
        practice_limit: 3,
        ..Config::default()
    })
}

pub fn create_test_app_with(config: Config) -> Router {
    let catalog = builtin_catalog().expect("builtin catalog is valid");
    shuxue_backend_rust::create_app_with(config, catalog)
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn get(app: &Router, uri: &str, user: Option<&str>) -> (StatusCode, Value) {
    send(app, "GET", uri, user, None).await
}

pub async fn post(app: &Router, uri: &str, user: Option<&str>, body: Value) -> (StatusCode, Value) {
    send(app, "POST", uri, user, Some(body)).await
}

/// Play a level to the end, answering every question with `answers[i]`.
/// Returns the final advance payload.
pub async fn play_level(app: &Router, user: &str, level_id: &str, answers: &[Value]) -> Value {
    let (status, started) = post(
        app,
        &format!("/api/levels/{level_id}/sessions"),
        Some(user),
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{started}");
    let session_id = started["data"]["sessionId"].as_str().unwrap().to_string();

    let mut last = Value::Null;
    for (index, answer) in answers.iter().enumerate() {
        let (status, body) = post(
            app,
            &format!("/api/sessions/{session_id}/answers"),
            Some(user),
            serde_json::json!({ "questionIndex": index, "answer": answer, "timeSpent": 5 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");

        let (status, body) = post(
            app,
            &format!("/api/sessions/{session_id}/advance"),
            Some(user),
            Value::Null,
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        last = body;
    }
    last
}
