#![cfg(feature = "http")]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::{Local, TimeZone};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use ratequeue::{HandlerError, HandlerFn, ManualClock, QueueBuilder, QueueConfig, http};

fn app(client_key: Option<&str>) -> Router {
    let clock = Arc::new(ManualClock::new(
        Local
            .with_ymd_and_hms(2024, 3, 14, 12, 0, 0)
            .single()
            .expect("unambiguous local time"),
    ));
    let handler = HandlerFn::arc("gen", |q: String| async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        Ok::<_, HandlerError>(json!({ "answer": format!("Echo: {q}") }))
    });
    let queue = QueueBuilder::new(QueueConfig::default(), handler)
        .with_clock(clock)
        .spawn(CancellationToken::new());
    http::router(queue, client_key.map(str::to_string))
}

fn submit(caller: Option<&str>, body: &str) -> Request<Body> {
    let mut req = Request::post("/jobs").header(header::CONTENT_TYPE, "application/json");
    if let Some(caller) = caller {
        req = req.header("x-user-id", caller);
    }
    req.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn submit_then_poll() {
    let app = app(None);

    let res = app
        .clone()
        .oneshot(submit(Some("u1"), r#"{"query":"ocean sunset"}"#))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let body = json_body(res).await;
    let job_id = body["jobId"].as_str().unwrap().to_string();

    let res = app
        .clone()
        .oneshot(get(&format!("/jobs/{job_id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    let status = body["status"].as_str().unwrap();
    assert!(status == "pending" || status == "processing", "{status}");
    assert!(body.get("result").is_none());
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn cooldown_is_429_with_retry_after() {
    let app = app(None);

    let res = app
        .clone()
        .oneshot(submit(Some("u1"), r#"{"query":"a"}"#))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);

    let res = app
        .clone()
        .oneshot(submit(Some("u1"), r#"{"query":"b"}"#))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.headers()[header::RETRY_AFTER], "60");
    let body = json_body(res).await;
    assert_eq!(body["error"], "caller must wait 60s before next request");
}

#[tokio::test]
async fn bad_input_is_400() {
    let app = app(None);

    let res = app
        .clone()
        .oneshot(submit(None, r#"{"query":"a"}"#))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .clone()
        .oneshot(submit(Some("u1"), "not json"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_eq!(body["error"], "invalid input: missing query");

    // The malformed attempt consumed nothing.
    let res = app
        .clone()
        .oneshot(submit(Some("u1"), r#"{"query":"a"}"#))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn unknown_job_is_404() {
    let app = app(None);
    for id in ["0b1e6a57-0000-4000-8000-000000000000", "nope"] {
        let res = app
            .clone()
            .oneshot(get(&format!("/jobs/{id}")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(res).await, json!({ "error": "Job not found" }));
    }
}

#[tokio::test]
async fn usage_reports_counts() {
    let app = app(None);
    app.clone()
        .oneshot(submit(Some("u1"), r#"{"query":"a"}"#))
        .await
        .unwrap();

    let req = Request::get("/usage")
        .header("x-user-id", "u1")
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["callerCount"], 1);
    assert_eq!(body["callerLimit"], 5);
    assert_eq!(body["globalCount"], 1);
    assert_eq!(body["globalLimit"], 50);

    let res = app.oneshot(get("/usage")).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn client_key_gates_everything_but_health() {
    let app = app(Some("s3cret"));

    let res = app
        .clone()
        .oneshot(submit(Some("u1"), r#"{"query":"a"}"#))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(res).await, json!({ "error": "Unauthorized" }));

    let req = Request::post("/jobs")
        .header("x-user-id", "u1")
        .header(header::AUTHORIZATION, "Bearer s3cret")
        .body(Body::from(r#"{"query":"a"}"#))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);

    let res = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["queue"]["name"], "global");
}
