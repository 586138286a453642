//! reqwest-backed `FlightProvider`.

use async_trait::async_trait;
use reqwest::Client;
use safar_core::envelope::{BookRequest, BrandedFaresRequest, ProviderRequestEnvelope, ValidateRequest};
use safar_core::{FlightProvider, ProviderError, ProviderResult};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::app_config::{EndpointPaths, ProviderConfig, TimeoutConfig};

pub struct HttpFlightProvider {
    http: Client,
    base_url: String,
    paths: EndpointPaths,
    timeouts: TimeoutConfig,
}

impl HttpFlightProvider {
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| ProviderError::Transport { operation: "init", message: e.to_string() })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            paths: config.paths.clone(),
            timeouts: config.timeouts,
        })
    }

    /// POST `body` as JSON, with the bearer token as `Authorization` when present.
    async fn post<B: Serialize + ?Sized>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
        token: Option<&str>,
        timeout: Duration,
    ) -> ProviderResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("POST {} ({})", url, operation);

        let mut request = self
            .http
            .post(&url)
            .timeout(timeout)
            .header("Accept", "application/json")
            .json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| transport_error(operation, e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| transport_error(operation, e))?;

        if !status.is_success() {
            let body: Option<Value> = serde_json::from_str(&text).ok();
            let message = body
                .as_ref()
                .and_then(error_message)
                .unwrap_or_else(|| fallback_message(&text, status.canonical_reason()));
            tracing::warn!("{} returned {}: {}", operation, status.as_u16(), message);
            return Err(ProviderError::Status {
                operation,
                status: status.as_u16(),
                message,
                body,
            });
        }

        serde_json::from_str(&text).map_err(|e| ProviderError::Decode { operation, message: e.to_string() })
    }
}

#[async_trait]
impl FlightProvider for HttpFlightProvider {
    async fn search(&self, request: &ProviderRequestEnvelope) -> ProviderResult<Value> {
        self.post("search", &self.paths.search, request, request.token.as_deref(), self.timeouts.search())
            .await
    }

    async fn validate(&self, request: &ValidateRequest) -> ProviderResult<Value> {
        self.post("validate", &self.paths.validate, request, request.token.as_deref(), self.timeouts.validate())
            .await
    }

    async fn book(&self, request: &BookRequest) -> ProviderResult<Value> {
        self.post("book", &self.paths.book, request, request.token.as_deref(), self.timeouts.book())
            .await
    }

    async fn branded_fares(&self, request: &BrandedFaresRequest) -> ProviderResult<Value> {
        self.post(
            "branded_fares",
            &self.paths.branded_fares,
            request,
            request.token.as_deref(),
            self.timeouts.branded(),
        )
        .await
    }
}

fn transport_error(operation: &'static str, e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout { operation }
    } else {
        ProviderError::Transport { operation, message: e.to_string() }
    }
}

/// Human-readable message from an error body: `message`, `detail`, `error`
/// as a string, or `error.message`.
pub fn error_message(body: &Value) -> Option<String> {
    ["message", "detail", "error"]
        .iter()
        .filter_map(|key| body.get(*key))
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Object(_) => v.get("message")?.as_str().map(str::to_string),
            _ => None,
        })
}

fn fallback_message(text: &str, reason: Option<&str>) -> String {
    let snippet: String = text.trim().chars().take(200).collect();
    if snippet.is_empty() {
        reason.unwrap_or("Request failed").to_string()
    } else {
        snippet
    }
}
