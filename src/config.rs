use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use crate::db::DEFAULT_MAX_POOL_SIZE;

pub const DEFAULT_NOTIFICATION_LOG_CAPACITY: usize = 1000;
pub const DEFAULT_EMERGENCY_SUBMISSION_CAPACITY: usize = 100;
pub const DEFAULT_AI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_AI_MODEL: &str = "gemini-1.5-flash";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub database_max_pool_size: u32,
    pub server_host: String,
    pub server_port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub jwt_expiry_minutes: i64,
    pub cors_allowed_origin: Option<String>,
    pub ai_api_url: String,
    pub ai_api_key: Option<String>,
    pub ai_model: String,
    pub meetings_api_url: Option<String>,
    pub http_timeout_seconds: u64,
    pub recipient_directory_path: Option<PathBuf>,
    pub notification_log_capacity: usize,
    pub emergency_submission_capacity: usize,
    pub push_webhook_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty());
        let database_max_pool_size = env::var("DATABASE_MAX_POOL_SIZE")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_MAX_POOL_SIZE);
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("SERVER_PORT must be a valid u16")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let jwt_issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| "iaoms".to_string());
        let jwt_audience =
            env::var("JWT_AUDIENCE").unwrap_or_else(|_| "iaoms-clients".to_string());
        let jwt_expiry_minutes = env::var("JWT_EXPIRY_MINUTES")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .context("JWT_EXPIRY_MINUTES must be an integer")?;
        let cors_allowed_origin = env::var("CORS_ALLOWED_ORIGIN").ok();
        let ai_api_url = env::var("AI_API_URL").unwrap_or_else(|_| DEFAULT_AI_API_URL.to_string());
        let ai_api_key = env::var("AI_API_KEY").ok().filter(|v| !v.trim().is_empty());
        let ai_model = env::var("AI_MODEL").unwrap_or_else(|_| DEFAULT_AI_MODEL.to_string());
        let meetings_api_url = env::var("MEETINGS_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let http_timeout_seconds = env::var("HTTP_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .context("HTTP_TIMEOUT_SECONDS must be an integer")?;
        let recipient_directory_path = env::var("RECIPIENT_DIRECTORY_PATH").ok().map(PathBuf::from);
        let notification_log_capacity = env::var("NOTIFICATION_LOG_CAPACITY")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_NOTIFICATION_LOG_CAPACITY);
        let emergency_submission_capacity = env::var("EMERGENCY_SUBMISSION_CAPACITY")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_EMERGENCY_SUBMISSION_CAPACITY);
        let push_webhook_url = env::var("PUSH_WEBHOOK_URL").ok();

        Ok(Self {
            database_url,
            database_max_pool_size,
            server_host,
            server_port,
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            jwt_expiry_minutes,
            cors_allowed_origin,
            ai_api_url,
            ai_api_key,
            ai_model,
            meetings_api_url,
            http_timeout_seconds,
            recipient_directory_path,
            notification_log_capacity,
            emergency_submission_capacity,
            push_webhook_url,
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds.max(1))
    }

    pub fn redacted_database_url(&self) -> String {
        match &self.database_url {
            Some(url) => redact_database_url(url),
            None => "memory".to_string(),
        }
    }
}

fn redact_database_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("*****"));
            }
            parsed.to_string()
        }
        Err(_) => "***".to_string(),
    }
}
