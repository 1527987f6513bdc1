//! Integration tests for the stock endpoints.

mod helpers;

use axum::http::StatusCode;
use helpers::{OWNER, RESELLER, STRANGER, TestApp};

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_missing_principal_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/stock/temp/day", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "UNAUTHORIZED");

    let response = app
        .request("GET", "/api/stock/temp/day", None, Some(0))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_import_then_count() {
    let app = TestApp::new().await;

    let response = app.import("temp", "day", "AAAA-1 BBBB-2\nAAAA-1").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["added"], 2);
    assert_eq!(response.body["data"]["duplicates"], 0);

    let response = app.import("temp", "day", "BBBB-2 CCCC-3").await;
    assert_eq!(response.body["data"]["added"], 1);
    assert_eq!(response.body["data"]["duplicates"], 1);

    let response = app
        .request("GET", "/api/stock/temp/day", None, Some(OWNER))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["unclaimed"], 3);
}

#[tokio::test]
async fn test_unknown_pool_is_bad_request() {
    let app = TestApp::new().await;

    let response = app
        .request("GET", "/api/stock/gold/day", None, Some(OWNER))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_allocate_and_no_stock() {
    let app = TestApp::new().await;
    app.import("perm", "week", "KEY-0001-ABCD").await;

    let response = app
        .request(
            "POST",
            "/api/stock/perm/week/allocate",
            Some(serde_json::json!({ "recipient_id": 555 })),
            Some(OWNER),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["key"], "KEY-0001-ABCD");
    assert_eq!(response.body["data"]["recipient_id"], 555);
    assert_eq!(response.body["data"]["allocated_by"], OWNER);

    let response = app
        .request(
            "POST",
            "/api/stock/perm/week/allocate",
            Some(serde_json::json!({ "recipient_id": 555 })),
            Some(OWNER),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "NO_STOCK");
}

#[tokio::test]
async fn test_allocate_rejects_bad_recipient() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/stock/perm/week/allocate",
            Some(serde_json::json!({ "recipient_id": 0 })),
            Some(OWNER),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_access_gating() {
    let app = TestApp::new().await;
    app.import("private", "day", "P-1 P-2").await;
    app.grant(RESELLER, "temp").await;

    for principal in [STRANGER, RESELLER] {
        let response = app
            .request(
                "POST",
                "/api/stock/private/day/allocate",
                Some(serde_json::json!({ "recipient_id": 9 })),
                Some(principal),
            )
            .await;
        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(response.body["error"], "ACCESS_DENIED");

        let response = app
            .request(
                "POST",
                "/api/stock/private/day/import",
                Some(serde_json::json!({ "text": "P-3" })),
                Some(principal),
            )
            .await;
        assert_eq!(response.status, StatusCode::FORBIDDEN);
    }

    let response = app
        .request("GET", "/api/stock/private/day", None, Some(OWNER))
        .await;
    assert_eq!(response.body["data"]["unclaimed"], 2);

    let response = app
        .request(
            "POST",
            "/api/stock/temp/day/import",
            Some(serde_json::json!({ "text": "T-1" })),
            Some(RESELLER),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_clear_status_and_rebuild_are_owner_only() {
    let app = TestApp::new().await;
    app.import("temp", "week", "W-1 W-2 W-3").await;
    app.grant(RESELLER, "temp").await;

    for (method, path) in [
        ("DELETE", "/api/stock/temp/week"),
        ("GET", "/api/stock/temp/week/status"),
        ("POST", "/api/stock/temp/week/mirror/rebuild"),
        ("GET", "/api/stock"),
    ] {
        let response = app.request(method, path, None, Some(RESELLER)).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{method} {path}");
    }

    let response = app
        .request("GET", "/api/stock/temp/week/status", None, Some(OWNER))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["drift_detected"], false);
    assert_eq!(response.body["data"]["mirror_lines"], 3);

    let response = app
        .request("POST", "/api/stock/temp/week/mirror/rebuild", None, Some(OWNER))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["lines_written"], 3);

    let response = app
        .request("DELETE", "/api/stock/temp/week", None, Some(OWNER))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["removed"], 3);

    let response = app.request("GET", "/api/stock", None, Some(OWNER)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"].as_array().unwrap().len(), 12);
}
