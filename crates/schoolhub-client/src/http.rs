//! Shared HTTP plumbing: authentication, status mapping, and response decoding.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use schoolhub_core::error::{ApiError, ApiResult};

use crate::config::ClientConfig;

/// Client for the school REST API.
///
/// Implements every service trait of `schoolhub_core::traits`. Cheap to
/// clone; clones share the connection pool.
#[derive(Clone)]
pub struct SchoolClient {
    base_url: String,
    token: Option<String>,
    timeout_secs: u64,
    pub(crate) client: reqwest::Client,
}

impl std::fmt::Debug for SchoolClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchoolClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl SchoolClient {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
            timeout_secs: config.timeout_secs,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Send a request and map transport failures and error statuses.
    pub(crate) async fn send(&self, req: RequestBuilder) -> ApiResult<Response> {
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.timeout_secs)
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);
        tracing::debug!(status = status.as_u16(), %message, "request failed");
        Err(match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
            StatusCode::FORBIDDEN => ApiError::Forbidden(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            _ => ApiError::Server {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// Send and decode a JSON body, bare or wrapped in `{ data }`.
    pub(crate) async fn json<T: DeserializeOwned>(&self, req: RequestBuilder) -> ApiResult<T> {
        let response = self.send(req).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        decode(&body)
    }

    /// Send and ignore the response body.
    pub(crate) async fn empty(&self, req: RequestBuilder) -> ApiResult<()> {
        self.send(req).await.map(|_| ())
    }

    /// Send and return the raw response bytes.
    pub(crate) async fn bytes(&self, req: RequestBuilder) -> ApiResult<Vec<u8>> {
        let response = self.send(req).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Decode a body that is either the bare document or wrapped as
/// `{ success, data, message }`.
///
/// When `data` is present only `data` is decoded, so a mismatched payload
/// surfaces as `Decode` rather than as the defaults of a bare parse. A list
/// in `data` may instead be a page whose `pagination` sits beside it.
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> ApiResult<T> {
    let value: Value = serde_json::from_str(body).map_err(decode_error)?;
    let Value::Object(mut object) = value else {
        return serde_json::from_value(value).map_err(decode_error);
    };

    if object.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(unsuccessful(object.get("message").and_then(Value::as_str)));
    }

    match object.remove("data") {
        Some(Value::Array(items)) => {
            let list = Value::Array(items);
            match serde_json::from_value::<T>(list.clone()) {
                Ok(decoded) => Ok(decoded),
                Err(e) => {
                    object.insert("data".to_string(), list);
                    serde_json::from_value(Value::Object(object)).map_err(|_| decode_error(e))
                }
            }
        }
        Some(data) => serde_json::from_value(data).map_err(decode_error),
        None => serde_json::from_value(Value::Object(object)).map_err(decode_error),
    }
}

fn decode_error(e: serde_json::Error) -> ApiError {
    ApiError::Decode(e.to_string())
}

/// A 200 response whose envelope reports failure.
fn unsuccessful(message: Option<&str>) -> ApiError {
    ApiError::Server {
        status: StatusCode::OK.as_u16(),
        message: message.unwrap_or("request failed").to_string(),
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| body.trim().to_string())
}
