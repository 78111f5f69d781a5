//! HTTP client for the CRM REST API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("invalid JSON payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status of a failed call that reached the server.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// The calls the client flows make. Paths are absolute (`/api/leads`).
#[async_trait]
pub trait CrmApi: Send + Sync {
    async fn get_json(&self, path: &str) -> ApiResult<Value>;
    async fn post_json(&self, path: &str, body: &Value) -> ApiResult<Value>;
}

#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET with query parameters encoded by reqwest, so free text such as a
    /// search term survives `&`, `#` and spaces.
    pub async fn get_json_with_query(&self, path: &str, query: &[(&str, &str)]) -> ApiResult<Value> {
        self.send(self.client.get(format!("{}{}", self.base_url, path)).query(query))
            .await
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Value> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(%status, bytes = text.len(), "api response");

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(text);
            return Err(ApiError::Status { status, message });
        }
        // Every endpoint answers with JSON, including creates.
        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl CrmApi for HttpApi {
    async fn get_json(&self, path: &str) -> ApiResult<Value> {
        self.send(self.client.get(format!("{}{}", self.base_url, path)))
            .await
    }

    async fn post_json(&self, path: &str, body: &Value) -> ApiResult<Value> {
        self.send(self.client.post(format!("{}{}", self.base_url, path)).json(body))
            .await
    }
}
