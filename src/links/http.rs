//! HTTP adapter for the external link-issuing API
//!
//! Endpoints (relative to the configured base URL):
//! - `POST resources/{id}/links` → `{"link": "..."}`
//! - `GET resources/{id}` → `{"title": "..."}`
//!
//! # Status Mapping
//!
//! | Response | Signal |
//! |----------|--------|
//! | HTTP 429 | `Throttled` (wait from `Retry-After`, then body `retry_after`, else 1s) |
//! | body code `RESOURCE_PRIVATE` | `PrivateResource` |
//! | HTTP 404/410, body code `RESOURCE_INVALID` | `InvalidResource` |
//! | HTTP 401/403 | `PermissionDenied` |
//! | anything else, transport errors | `Other` |

use crate::config::ApiConfig;
use crate::links::{ApiError, ApiResult, ExternalApi};
use crate::{ChanfindError, ConfigError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Wait used when a throttle response carries no hint
pub const DEFAULT_THROTTLE_WAIT: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct LinkResponse {
    link: String,
}

#[derive(Debug, Deserialize)]
struct TitleResponse {
    title: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    retry_after: Option<u64>,
}

/// `ExternalApi` over HTTP/JSON
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: Url,
}

impl HttpApi {
    /// Builds the adapter from the `[api]` configuration section
    pub fn new(config: &ApiConfig) -> Result<Self, ChanfindError> {
        let base_url = Url::parse(&config.base_url)?;

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                ConfigError::Validation("api.auth-token contains invalid characters".to_string())
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(concat!("chanfind/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Builds `{base}/resources/{id}[/extra]` with the id percent-encoded
    fn resource_url(&self, resource_id: &str, extra: Option<&str>) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::Other(format!("Base URL cannot hold a path: {}", self.base_url)))?;
            segments.pop_if_empty().push("resources").push(resource_id);
            if let Some(extra) = extra {
                segments.push(extra);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl ExternalApi for HttpApi {
    async fn issue_link(&self, resource_id: &str) -> ApiResult<String> {
        let url = self.resource_url(resource_id, Some("links"))?;
        tracing::debug!("POST {}", url);

        let response = self.client.post(url).send().await.map_err(transport_error)?;
        let response = check_status(response).await?;
        let body: LinkResponse = response.json().await.map_err(transport_error)?;
        Ok(body.link)
    }

    async fn fetch_title(&self, resource_id: &str) -> ApiResult<String> {
        let url = self.resource_url(resource_id, None)?;
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await.map_err(transport_error)?;
        let response = check_status(response).await?;
        let body: TitleResponse = response.json().await.map_err(transport_error)?;
        Ok(body.title)
    }
}

fn transport_error(error: reqwest::Error) -> ApiError {
    ApiError::Other(error.to_string())
}

/// Passes successful responses through and maps the rest to signals
async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let header_wait = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);

    let text = response.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();

    Err(map_error(status, header_wait, body, &text))
}

fn map_error(status: StatusCode, header_wait: Option<Duration>, body: ErrorBody, raw: &str) -> ApiError {
    let code = body.code.as_deref();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let wait = header_wait
            .or(body.retry_after.map(Duration::from_secs))
            .unwrap_or(DEFAULT_THROTTLE_WAIT);
        return ApiError::Throttled { wait };
    }

    if code == Some("RESOURCE_PRIVATE") {
        return ApiError::PrivateResource;
    }

    if matches!(status, StatusCode::NOT_FOUND | StatusCode::GONE) || code == Some("RESOURCE_INVALID") {
        return ApiError::InvalidResource;
    }

    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return ApiError::PermissionDenied;
    }

    let detail = body
        .message
        .or(body.code)
        .unwrap_or_else(|| raw.trim().to_string());
    ApiError::Other(format!("HTTP {}: {}", status.as_u16(), detail))
}
