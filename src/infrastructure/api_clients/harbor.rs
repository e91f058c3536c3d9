//! Harbor v2.0 API client implementation

use super::traits::{HarborApiClient, HarborSearchResult, UpstreamResponse};
use crate::application::errors::{ApiError, RegistryError};
use crate::config::HarborConfig;
use crate::domain::RegistryInstance;
use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Harbor wants a slash inside a repository path segment encoded twice
const DOUBLE_ENCODED_SLASH: &str = "%252F";

/// Client for the Harbor v2.0 REST API, shared across all configured instances
pub struct HarborClient {
    client: Client,
    timeout: Duration,
    page_size: u32,
}

impl HarborClient {
    /// Create a new client; `timeout` bounds every single upstream call
    pub fn new(timeout: Duration, page_size: u32) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("harborview/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            timeout,
            page_size,
        })
    }

    pub fn from_config(config: &HarborConfig) -> Result<Self, RegistryError> {
        Self::new(Duration::from_secs(config.timeout_seconds), config.page_size)
    }

    /// Replace the first `/` of a repository name for use in a URL path segment
    pub fn encode_repository_path(repository: &str) -> String {
        repository.replacen('/', DOUBLE_ENCODED_SLASH, 1)
    }

    /// URL listing the newest artifacts of a repository, with tags and scan overviews inline
    pub fn artifacts_url(
        instance: &RegistryInstance,
        project: &str,
        repository: &str,
        page_size: u32,
    ) -> String {
        format!(
            "{}/api/v2.0/projects/{}/repositories/{}/artifacts?page=1&page_size={}&with_tag=true&with_label=false&with_scan_overview=true&with_signature=false&with_immutable_status=false",
            instance.base_url(),
            project,
            Self::encode_repository_path(repository),
            page_size
        )
    }

    pub fn search_url(instance: &RegistryInstance) -> String {
        format!("{}/api/v2.0/search", instance.base_url())
    }

    /// Basic credentials: base64 of the literal `username:password`
    pub fn authorization_header(instance: &RegistryInstance) -> String {
        let credentials = format!("{}:{}", instance.username, instance.password);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(credentials)
        )
    }

    /// Pull a human readable message out of Harbor's error payloads:
    /// `{"errors":[{"code":..,"message":..}]}` or `{"error":{"message":..}}`
    fn upstream_error_message(body: &Value) -> Option<String> {
        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            let messages: Vec<String> = errors
                .iter()
                .map(|error| {
                    error
                        .get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| error.to_string())
                })
                .collect();
            return Some(messages.join("; "));
        }

        match body.get("error")? {
            Value::String(message) => Some(message.clone()),
            error => Some(
                error
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string()),
            ),
        }
    }

    fn transport_error(&self, error: reqwest::Error) -> RegistryError {
        if error.is_timeout() {
            RegistryError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            RegistryError::Network(error)
        }
    }

    /// Send an authenticated GET and classify the answer
    async fn get_json(
        &self,
        instance: &RegistryInstance,
        request: RequestBuilder,
    ) -> Result<UpstreamResponse<Value>, RegistryError> {
        let response = request
            .header(reqwest::header::AUTHORIZATION, Self::authorization_header(instance))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(RegistryError::Api(ApiError::Authentication));
        }

        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        let body: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(body) => body,
                Err(e) if status.is_success() => return Err(RegistryError::Json(e)),
                Err(_) => {
                    return Err(RegistryError::Api(ApiError::Http {
                        status: status.as_u16(),
                        message: format!("Harbor API error: {}", text),
                    }));
                }
            }
        };

        if let Some(message) = Self::upstream_error_message(&body) {
            debug!(status = status.as_u16(), message = %message, "Harbor reported an error");
            return Ok(UpstreamResponse::UpstreamError(message));
        }

        if !status.is_success() {
            return Err(RegistryError::Api(ApiError::Http {
                status: status.as_u16(),
                message: format!("Harbor API error: {}", text),
            }));
        }

        if body.is_null() {
            return Ok(UpstreamResponse::Empty);
        }

        Ok(UpstreamResponse::Success(body))
    }
}

#[async_trait]
impl HarborApiClient for HarborClient {
    async fn list_artifacts(
        &self,
        instance: &RegistryInstance,
        project: &str,
        repository: &str,
    ) -> Result<UpstreamResponse<Vec<Value>>, RegistryError> {
        let url = Self::artifacts_url(instance, project, repository, self.page_size);
        debug!(url = %url, "Listing artifacts");

        match self.get_json(instance, self.client.get(&url)).await? {
            UpstreamResponse::Success(body) => {
                let artifacts: Vec<Value> = serde_json::from_value(body)?;
                if artifacts.is_empty() {
                    Ok(UpstreamResponse::Empty)
                } else {
                    Ok(UpstreamResponse::Success(artifacts))
                }
            }
            UpstreamResponse::UpstreamError(message) => Ok(UpstreamResponse::UpstreamError(message)),
            UpstreamResponse::Empty => Ok(UpstreamResponse::Empty),
        }
    }

    async fn search(
        &self,
        instance: &RegistryInstance,
        term: &str,
    ) -> Result<UpstreamResponse<HarborSearchResult>, RegistryError> {
        let request = self
            .client
            .get(Self::search_url(instance))
            .query(&[("q", term)]);

        match self.get_json(instance, request).await? {
            UpstreamResponse::Success(body) => {
                let result: HarborSearchResult = serde_json::from_value(body)?;
                if result.repository.is_empty() {
                    Ok(UpstreamResponse::Empty)
                } else {
                    Ok(UpstreamResponse::Success(result))
                }
            }
            UpstreamResponse::UpstreamError(message) => Ok(UpstreamResponse::UpstreamError(message)),
            UpstreamResponse::Empty => Ok(UpstreamResponse::Empty),
        }
    }
}
