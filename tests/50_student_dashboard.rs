mod common;

use std::collections::HashMap;

use anyhow::Result;
use axum::{extract::Query, http::StatusCode as AxumStatus, routing::get, Json, Router};
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn echo_dashboard(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!({
        "student": { "email": params.get("email") },
        "assignments": [{ "id": "hw-1", "title": "Fractions worksheet" }]
    }))
}

async fn maintenance() -> (AxumStatus, Json<Value>) {
    (AxumStatus::SERVICE_UNAVAILABLE, Json(json!({ "error": "maintenance window" })))
}

#[tokio::test]
async fn upstream_payload_is_forwarded_with_email() -> Result<()> {
    let upstream = common::spawn_fake(Router::new().route("/student/dashboard", get(echo_dashboard))).await?;
    let server = common::spawn_server(common::test_config(&upstream)).await?;
    let token = common::sign_in(&server, common::STUDENT_EMAIL).await?;

    let res = reqwest::Client::new()
        .get(server.url("/api/student/dashboard"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["student"]["email"], common::STUDENT_EMAIL);
    assert_eq!(body["assignments"][0]["id"], "hw-1");
    Ok(())
}

#[tokio::test]
async fn upstream_error_status_passes_through() -> Result<()> {
    let upstream = common::spawn_fake(Router::new().route("/student/dashboard", get(maintenance))).await?;
    let server = common::spawn_server(common::test_config(&upstream)).await?;
    let token = common::sign_in(&server, common::STUDENT_EMAIL).await?;

    let res = reqwest::Client::new()
        .get(server.url("/api/student/dashboard"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = res.json().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["details"]["error"], "maintenance window");
    Ok(())
}

#[tokio::test]
async fn unreachable_upstream_is_internal_error() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = common::sign_in(&server, common::STUDENT_EMAIL).await?;

    let res = reqwest::Client::new()
        .get(server.url("/api/student/dashboard"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}

#[tokio::test]
async fn parent_cannot_read_student_dashboard() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = common::sign_in(&server, common::PARENT_EMAIL).await?;

    let res = reqwest::Client::new()
        .get(server.url("/api/student/dashboard"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
