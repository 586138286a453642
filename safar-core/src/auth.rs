use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::provider::ProviderResult;

/// Something that can mint a bearer token for the flight provider.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self) -> ProviderResult<String>;
}

/// A token handed in from configuration.
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn fetch_token(&self) -> ProviderResult<String> {
        Ok(self.token.clone())
    }
}

/// Session-wide bearer token: absent, then fetched once, then reused.
///
/// `ensure_token` is single-flight. Concurrent callers wait on the same
/// in-flight fetch. A failed fetch leaves the cell empty so a later call can
/// try again.
pub struct AuthContext {
    source: Option<Arc<dyn TokenSource>>,
    token: OnceCell<String>,
}

impl AuthContext {
    /// No token and no way to get one. Searches go out anonymously.
    pub fn anonymous() -> Self {
        Self { source: None, token: OnceCell::new() }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self { source: None, token: OnceCell::new_with(Some(token.into())) }
    }

    pub fn with_source(source: Arc<dyn TokenSource>) -> Self {
        Self { source: Some(source), token: OnceCell::new() }
    }

    pub fn current(&self) -> Option<&str> {
        self.token.get().map(String::as_str)
    }

    pub async fn ensure_token(&self) -> ProviderResult<Option<String>> {
        if let Some(token) = self.token.get() {
            return Ok(Some(token.clone()));
        }
        let Some(source) = &self.source else {
            return Ok(None);
        };

        let token = self
            .token
            .get_or_try_init(|| async {
                tracing::info!("Fetching provider bearer token");
                source.fetch_token().await
            })
            .await?;
        Ok(Some(token.clone()))
    }
}
