//! Single-shot request execution
//!
//! The executor turns an [`ApiRequest`] into one HTTP exchange and decodes
//! the outcome. It holds no session state: the caller decides which token
//! to attach, which keeps refresh handling entirely in the client.

use assetdesk_domain::constants::REQUEST_ID_HEADER;
use assetdesk_domain::{ApiConfig, ClientError};
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use super::request::{ApiRequest, RequestBody};
use crate::errors::InfraError;
use crate::http::HttpClient;

/// Sends API requests relative to a base URL
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    http: HttpClient,
    base_url: String,
}

impl RequestExecutor {
    /// # Errors
    /// Returns `ClientError::Config` if `base_url` is not an http(s) URL.
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Result<Self, ClientError> {
        let base_url = base_url.into();
        let parsed = Url::parse(&base_url)
            .map_err(|e| ClientError::Config(format!("Invalid base URL {base_url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!("Unsupported URL scheme: {}", parsed.scheme())));
        }

        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
    }

    /// Build the transport from API settings.
    ///
    /// # Errors
    /// Returns `ClientError::Config` for an invalid base URL or HTTP client.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ClientError> {
        let http = HttpClient::builder()
            .timeout(config.timeout())
            .max_attempts(config.max_attempts)
            .user_agent(config.user_agent.clone())
            .build()?;
        Self::new(http, config.base_url.clone())
    }

    /// Copy of this executor whose transport never retries.
    pub fn single_attempt(&self) -> Self {
        Self { http: self.http.single_attempt(), base_url: self.base_url.clone() }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send `request` once.
    ///
    /// `token` becomes the bearer credential when present. `request_id` is
    /// sent as `X-Request-ID` so an operation and its resend correlate.
    ///
    /// # Errors
    /// - `ClientError::Network` on transport failure
    /// - `ClientError::Api` for any non-2xx status
    /// - `ClientError::Parse` when a success body is not JSON
    #[instrument(
        skip(self, request, token),
        fields(method = %request.method(), path = %request.path(), request_id = %request_id)
    )]
    pub async fn send(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
        request_id: &str,
    ) -> Result<Value, ClientError> {
        let url = self.url(request.path());
        let mut builder = self.http.request(request.method().clone(), &url);

        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }

        let drop_content_type = matches!(request.body(), RequestBody::Multipart(_));
        for (name, value) in request.headers() {
            if drop_content_type && name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = builder.header(REQUEST_ID_HEADER, request_id);
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        builder = match request.body() {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.form(fields),
            RequestBody::Multipart(payload) => builder.multipart(payload.to_form()?),
            RequestBody::Binary(bytes) => builder.body(bytes.clone()),
        };

        let response = self.http.send(builder).await?;
        let status = response.status();
        let text = response.text().await.map_err(|e| ClientError::from(InfraError::from(e)))?;

        debug!(status = status.as_u16(), bytes = text.len(), "API response received");

        if !status.is_success() {
            return Err(ClientError::api(status.as_u16(), server_message(&text)));
        }

        decode_body(&text)
    }
}

/// Decode a success body; an empty body is an empty object.
pub(crate) fn decode_body(text: &str) -> Result<Value, ClientError> {
    if text.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(text).map_err(|e| ClientError::Parse(e.to_string()))
}

/// Pull a human-readable message out of an error body.
///
/// Prefers `detail` (string, or the serialized validation list), then
/// `message`, then the raw text.
pub(crate) fn server_message(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(Value::Object(body)) = serde_json::from_str::<Value>(trimmed) {
        for field in ["detail", "message"] {
            match body.get(field) {
                Some(Value::String(message)) => return Some(message.clone()),
                Some(Value::Null) | None => {}
                Some(other) => return Some(other.to_string()),
            }
        }
    }

    Some(trimmed.to_string())
}
