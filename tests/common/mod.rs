use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use iaoms::auth::jwt::JwtService;
use iaoms::clock::{ManualClock, TokioTimer};
use iaoms::config::AppConfig;
use iaoms::db;
use iaoms::directory::RecipientDirectory;
use iaoms::meetings::MeetingsClient;
use iaoms::notifications::{EmergencyScheduler, PushGateway};
use iaoms::routes;
use iaoms::state::{AppParts, AppState};
use iaoms::store::MemoryStore;
use iaoms::submission::Submitter;
use iaoms::summary::DocumentSummarizer;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tower::util::ServiceExt;
use uuid::Uuid;

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPush {
    pub recipient_id: String,
    pub title: String,
    pub body: String,
}

#[derive(Default)]
pub struct RecordingPushGateway {
    sent: Mutex<Vec<SentPush>>,
}

#[async_trait]
impl PushGateway for RecordingPushGateway {
    async fn push(&self, recipient_id: &str, title: &str, body: &str) -> Result<()> {
        self.sent.lock().await.push(SentPush {
            recipient_id: recipient_id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

impl RecordingPushGateway {
    #[allow(dead_code)]
    pub async fn sent(&self) -> Vec<SentPush> {
        self.sent.lock().await.clone()
    }
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub push: Arc<RecordingPushGateway>,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: None,
        database_max_pool_size: db::DEFAULT_MAX_POOL_SIZE,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        jwt_secret: "test-secret".to_string(),
        jwt_issuer: "test-issuer".to_string(),
        jwt_audience: "test-audience".to_string(),
        jwt_expiry_minutes: 60,
        cors_allowed_origin: None,
        ai_api_url: "http://127.0.0.1:9".to_string(),
        ai_api_key: None,
        ai_model: "gemini-1.5-flash".to_string(),
        meetings_api_url: None,
        http_timeout_seconds: 1,
        recipient_directory_path: None,
        notification_log_capacity: 1000,
        emergency_submission_capacity: 100,
        push_webhook_url: None,
    }
}

impl TestApp {
    pub fn new() -> Result<Self> {
        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0)
                .single()
                .ok_or_else(|| anyhow!("invalid start time"))?,
        ));
        let push = Arc::new(RecordingPushGateway::default());

        let scheduler = EmergencyScheduler::new(
            store.clone(),
            Arc::new(TokioTimer),
            clock.clone(),
            push.clone(),
            config.notification_log_capacity,
            config.emergency_submission_capacity,
        );
        let summarizer = DocumentSummarizer::new(
            config.ai_api_url.clone(),
            None,
            config.ai_model.clone(),
            Duration::from_secs(1),
        )?;
        let meetings = MeetingsClient::new(None, Duration::from_secs(1), store.clone(), clock.clone())?;
        let jwt = JwtService::from_config(&config)?;

        let state = AppState::new(AppParts {
            config,
            store: store.clone(),
            directory: RecipientDirectory::institutional_defaults(),
            clock: clock.clone(),
            scheduler,
            summarizer,
            meetings,
            jwt,
        });
        let router = routes::create_router(state.clone());

        Ok(Self {
            state,
            router,
            store,
            clock,
            push,
        })
    }

    pub fn token_for(&self, id: &str, name: &str, department: &str, role: &str) -> Result<String> {
        self.state.jwt.generate_token(&Submitter {
            id: id.to_string(),
            name: name.to_string(),
            department: department.to_string(),
            role: role.to_string(),
        })
    }

    #[allow(dead_code)]
    pub fn employee_token(&self) -> Result<String> {
        self.token_for("emp-1042", "Prof. Jane Doe", "CSE", "employee")
    }

    #[allow(dead_code)]
    pub fn hod_token(&self) -> Result<String> {
        self.token_for("hod-cse", "Dr. Michael Chen", "CSE", "hod")
    }

    async fn send(&self, request: Request<Body>) -> Result<hyper::Response<Body>> {
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    async fn send_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(body))?).await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::POST, path, payload, token).await
    }

    #[allow(dead_code)]
    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::PUT, path, payload, token).await
    }

    #[allow(dead_code)]
    pub async fn patch_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::PATCH, path, payload, token).await
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty())?).await
    }

    #[allow(dead_code)]
    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::DELETE).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty())?).await
    }

    /// Posts a multipart submission: one `payload` JSON part plus one `file`
    /// part per entry.
    #[allow(dead_code)]
    pub async fn post_multipart<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        files: &[(&str, &str, &[u8])],
        token: &str,
    ) -> Result<hyper::Response<Body>> {
        let boundary = format!("boundary-{}", Uuid::new_v4());
        let mut body = Vec::new();
        body.extend(format!("--{boundary}\r\n").as_bytes());
        body.extend(b"Content-Disposition: form-data; name=\"payload\"\r\n\r\n");
        body.extend(serde_json::to_vec(payload)?);
        body.extend(b"\r\n");

        for (filename, content_type, data) in files {
            body.extend(format!("--{boundary}\r\n").as_bytes());
            body.extend(
                format!(
                    "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                    filename
                )
                .as_bytes(),
            );
            body.extend(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
            body.extend(*data);
            body.extend(b"\r\n");
        }
        body.extend(format!("--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(body))?;
        self.send(request).await
    }
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

/// Asserts the status and decodes the JSON body.
#[allow(dead_code)]
pub async fn expect_json<T: DeserializeOwned>(
    response: hyper::Response<Body>,
    status: StatusCode,
) -> Result<T> {
    let actual = response.status();
    let body = body_to_vec(response.into_body()).await?;
    if actual != status {
        return Err(anyhow!(
            "expected {status}, got {actual}: {}",
            String::from_utf8_lossy(&body)
        ));
    }
    Ok(serde_json::from_slice(&body)?)
}
