#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use annotation_api::{
    clock::MockClock,
    config::SecurityConfig,
    database::MemoryStore,
    rate_limit::{LimitPolicy, RateLimitConfig, RateLimiter},
    services::{AnnotationService, ServiceSettings},
    storage::{MemoryBucket, UrlSigner},
    AppState,
};

pub const BASE_URL: &str = "http://api.test";
pub const OWNER: &str = "203.0.113.10";
pub const GUEST: &str = "198.51.100.20";

/// Router wired to in-memory storage and a manually driven clock.
pub struct TestApp {
    pub router: Router,
    pub clock: Arc<MockClock>,
    pub store: Arc<MemoryStore>,
    pub bucket: Arc<MemoryBucket>,
    pub limiter: Arc<RateLimiter>,
}

/// Response status plus the parsed JSON body (`Null` for non-JSON bodies).
pub struct TestResponse {
    pub status: StatusCode,
    pub retry_after: Option<String>,
    pub body: Value,
    pub raw: Vec<u8>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_limits(RateLimitConfig::default())
    }

    pub fn with_limits(limits: RateLimitConfig) -> Self {
        let clock = Arc::new(MockClock::at_epoch());
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let signer = UrlSigner::new(BASE_URL, "test-secret", clock.clone());
        let bucket = Arc::new(MemoryBucket::new(signer));
        let limiter = Arc::new(RateLimiter::new(limits, clock.clone()));

        let service = AnnotationService::new(
            store.clone(),
            bucket.clone(),
            limiter.clone(),
            ServiceSettings {
                frontend_url: "http://frontend.test".to_string(),
                upload_url_ttl: Duration::from_secs(3600),
                max_upload_bytes: 1024,
            },
        );

        let security = SecurityConfig {
            enable_cors: true,
            cors_origins: vec!["http://frontend.test".to_string()],
        };
        let router = annotation_api::app(AppState::new(service), &security);

        Self {
            router,
            clock,
            store,
            bucket,
            limiter,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        client: Option<&str>,
        body: Option<Value>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(client) = client {
            builder = builder.header("x-forwarded-for", client);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .context("router call failed")?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let raw = to_bytes(response.into_body(), usize::MAX).await?.to_vec();
        let body = serde_json::from_slice(&raw).unwrap_or(Value::Null);

        Ok(TestResponse {
            status,
            retry_after,
            body,
            raw,
        })
    }

    pub async fn get(&self, uri: &str, client: &str) -> Result<TestResponse> {
        self.request(Method::GET, uri, Some(client), None).await
    }

    pub async fn post(&self, uri: &str, client: &str, body: Value) -> Result<TestResponse> {
        self.request(Method::POST, uri, Some(client), Some(body)).await
    }

    /// Register an image owned by `client` through the signed upload flow.
    pub async fn upload_image(&self, client: &str) -> Result<i64> {
        let res = self
            .post(
                "/images/upload",
                client,
                serde_json::json!({ "filename": "cat.png", "contentType": "image/png" }),
            )
            .await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "upload failed: {} {}", res.status, res.body);
        res.body["data"]["imageId"].as_i64().context("missing imageId")
    }

    pub async fn share_token(&self, image_id: i64, owner: &str) -> Result<String> {
        let res = self
            .post(&format!("/images/{}/share", image_id), owner, serde_json::json!({}))
            .await?;
        anyhow::ensure!(res.status == StatusCode::OK, "share failed: {} {}", res.status, res.body);
        res.body["data"]["shareToken"]
            .as_str()
            .map(str::to_string)
            .context("missing shareToken")
    }

    pub async fn annotate(&self, image_id: i64, client: &str, share_token: Option<&str>) -> Result<TestResponse> {
        let mut body = serde_json::json!({ "imageId": image_id, "x": 10.0, "y": 20.0, "radius": 5.0 });
        if let Some(token) = share_token {
            body["shareToken"] = Value::from(token);
        }
        self.post("/annotations", client, body).await
    }
}

/// Limits small enough to exhaust in a handful of requests.
pub fn tight_limits(general: u32, upload: u32, chat: u32) -> RateLimitConfig {
    RateLimitConfig {
        enabled: true,
        general: LimitPolicy::new(general, Duration::from_secs(60)),
        upload: LimitPolicy::new(upload, Duration::from_secs(300)),
        chat: LimitPolicy::new(chat, Duration::from_secs(60)),
    }
}
