use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, Response},
    Router,
};
use clinic_admin_api::{
    api_v1_routes, auth,
    config::AppConfig,
    db,
    events::{self, EventSender},
    status_routes, AppState,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

/// Test harness backed by an in-memory SQLite database. One pooled connection
/// keeps the database alive for the lifetime of the app.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub admin_id: Uuid,
    pub staff_id: Uuid,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_gateway_url(None).await
    }

    /// Points the payment gateway client at a mock server.
    pub async fn with_gateway(base_url: &str) -> Self {
        Self::with_gateway_url(Some(base_url.to_string())).await
    }

    async fn with_gateway_url(gateway_url: Option<String>) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        if let Some(url) = gateway_url {
            cfg.payment_gateway_url = url;
            cfg.payment_gateway_secret = Some("sk_test".to_string());
        }

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx, db_arc.clone()));

        let state = AppState::new(db_arc, cfg, event_sender);
        let router = Router::new()
            .merge(status_routes())
            .nest("/api/v1", api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            admin_id: Uuid::new_v4(),
            staff_id: Uuid::new_v4(),
            _event_task: event_task,
        }
    }

    /// Raw request without identity headers.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response<Body> {
        self.send(method, uri, body, None).await
    }

    /// Request with admin identity headers.
    pub async fn request_as_admin(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response<Body> {
        self.send(
            method,
            uri,
            body,
            Some((self.admin_id, "Test Admin", "admin")),
        )
        .await
    }

    /// Request with staff identity headers.
    pub async fn request_as_staff(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response<Body> {
        self.send(
            method,
            uri,
            body,
            Some((self.staff_id, "Front Desk", "staff")),
        )
        .await
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        identity: Option<(Uuid, &str, &str)>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((user_id, name, role)) = identity {
            builder = builder
                .header(auth::USER_ID_HEADER, user_id.to_string())
                .header(auth::USER_NAME_HEADER, name)
                .header(auth::USER_ROLE_HEADER, role);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Reads a response body as JSON.
pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}
