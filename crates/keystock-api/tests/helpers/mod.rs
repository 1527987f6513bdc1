//! Shared fixture for API integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use keystock_api::{AppState, build_router};
use keystock_core::config::AppConfig;
use keystock_database::{DatabasePool, migration};
use keystock_storage::LocalMirrorStore;

pub const OWNER: i64 = 1;
pub const RESELLER: i64 = 2;
pub const STRANGER: i64 = 3;

pub struct TestResponse {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

pub struct TestApp {
    _dir: tempfile::TempDir,
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();

        let mut config = AppConfig::default();
        config.database.url = format!("sqlite://{}", dir.path().join("api.db").display());
        config.inventory.owners = vec![OWNER];
        config.inventory.mirror_dir = dir.path().join("stock").display().to_string();

        let db = DatabasePool::connect(&config.database).await.unwrap();
        migration::run_migrations(db.pool()).await.unwrap();
        let mirror = Arc::new(
            LocalMirrorStore::new(&config.inventory.mirror_dir)
                .await
                .unwrap(),
        );

        let state = AppState::new(config, db, mirror);
        let router = build_router(state.clone());

        Self {
            _dir: dir,
            router,
            state,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<serde_json::Value>,
        principal: Option<i64>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(p) = principal {
            builder = builder.header("x-principal-id", p.to_string());
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };

        TestResponse { status, body }
    }

    pub async fn grant(&self, principal: i64, program: &str) {
        let response = self
            .request(
                "PUT",
                &format!("/api/grants/{principal}/{program}"),
                None,
                Some(OWNER),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }

    pub async fn import(&self, program: &str, duration: &str, text: &str) -> TestResponse {
        self.request(
            "POST",
            &format!("/api/stock/{program}/{duration}/import"),
            Some(serde_json::json!({ "text": text })),
            Some(OWNER),
        )
        .await
    }
}
