use async_trait::async_trait;
use reqwest::Client;
use safar_core::auth::{StaticTokenSource, TokenSource};
use safar_core::{AuthContext, ProviderError, ProviderResult};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::AuthConfig;
use crate::provider_client::error_message;

const TOKEN_TIMEOUT: Duration = Duration::from_secs(30);

/// Client-credentials token endpoint.
pub struct HttpTokenSource {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl HttpTokenSource {
    pub fn new(token_url: impl Into<String>, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

#[async_trait]
impl TokenSource for HttpTokenSource {
    async fn fetch_token(&self) -> ProviderResult<String> {
        let response = self
            .http
            .post(&self.token_url)
            .timeout(TOKEN_TIMEOUT)
            .json(&json!({ "clientId": self.client_id, "clientSecret": self.client_secret }))
            .send()
            .await
            .map_err(|e| ProviderError::Auth(e.to_string()))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Auth(format!("unreadable token response: {}", e)))?;

        if !status.is_success() {
            let message = error_message(&body).unwrap_or_else(|| status.to_string());
            return Err(ProviderError::Auth(message));
        }

        token_from(&body).ok_or_else(|| ProviderError::Auth("token response carried no token".into()))
    }
}

fn token_from(body: &Value) -> Option<String> {
    let data = body.get("data").filter(|d| d.is_object()).unwrap_or(body);
    ["token", "accessToken", "access_token"]
        .iter()
        .find_map(|key| data.get(*key)?.as_str())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Build the session `AuthContext` from configuration. A static token wins
/// over the token endpoint. With neither, searches go out anonymously.
pub fn auth_context(config: &AuthConfig) -> AuthContext {
    if let Some(token) = config.static_token.as_deref().filter(|t| !t.is_empty()) {
        return AuthContext::with_source(Arc::new(StaticTokenSource::new(token)));
    }

    match (&config.token_url, &config.client_id, &config.client_secret) {
        (Some(url), Some(id), Some(secret)) => {
            AuthContext::with_source(Arc::new(HttpTokenSource::new(url.as_str(), id.as_str(), secret.as_str())))
        }
        _ => {
            tracing::warn!("No provider credentials configured, requests will be sent without a bearer token");
            AuthContext::anonymous()
        }
    }
}
