use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Mutex;

use crate::envelope::{BookRequest, BrandedFaresRequest, ProviderRequestEnvelope, ValidateRequest};

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    #[error("{operation} failed with status {status}: {message}")]
    Status {
        operation: &'static str,
        status: u16,
        message: String,
        body: Option<Value>,
    },

    #[error("{operation} could not reach the provider: {message}")]
    Transport { operation: &'static str, message: String },

    #[error("{operation} returned an unreadable body: {message}")]
    Decode { operation: &'static str, message: String },

    #[error("Authorization failed: {0}")]
    Auth(String),
}

impl ProviderError {
    /// Raw response body, when the provider sent one.
    pub fn body(&self) -> Option<&Value> {
        match self {
            ProviderError::Status { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// The upstream flight provider. Responses are returned as raw JSON because
/// their shape is not stable across endpoints or suppliers.
#[async_trait]
pub trait FlightProvider: Send + Sync {
    async fn search(&self, request: &ProviderRequestEnvelope) -> ProviderResult<Value>;

    /// Exchange a priced itinerary for a sealed token.
    async fn validate(&self, request: &ValidateRequest) -> ProviderResult<Value>;

    async fn book(&self, request: &BookRequest) -> ProviderResult<Value>;

    /// Side channel for offers whose brands are not part of the search payload.
    async fn branded_fares(&self, request: &BrandedFaresRequest) -> ProviderResult<Value>;
}

// ============================================================================
// Mock provider
// ============================================================================

type Handler<R> = Box<dyn Fn(&R) -> ProviderResult<Value> + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub struct MockCalls {
    pub searches: Vec<ProviderRequestEnvelope>,
    pub validations: Vec<ValidateRequest>,
    pub bookings: Vec<BookRequest>,
    pub branded: Vec<BrandedFaresRequest>,
}

/// Scriptable in-memory provider. Every request is recorded so callers can
/// assert on what was sent.
pub struct MockFlightProvider {
    search: Handler<ProviderRequestEnvelope>,
    validate: Handler<ValidateRequest>,
    book: Handler<BookRequest>,
    branded: Handler<BrandedFaresRequest>,
    calls: Mutex<MockCalls>,
}

impl MockFlightProvider {
    pub fn new() -> Self {
        Self {
            search: Box::new(|_| Ok(json!({ "flights": [] }))),
            validate: Box::new(|_| Ok(json!({ "sealed": "mock-sealed-token" }))),
            book: Box::new(|_| {
                Ok(json!({
                    "success": true,
                    "pnr": "MOCK01",
                    "bookingRefId": "BR-MOCK-01",
                    "status": "CONFIRMED"
                }))
            }),
            branded: Box::new(|_| Ok(json!({ "brands": [] }))),
            calls: Mutex::new(MockCalls::default()),
        }
    }

    pub fn on_search<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ProviderRequestEnvelope) -> ProviderResult<Value> + Send + Sync + 'static,
    {
        self.search = Box::new(handler);
        self
    }

    pub fn on_validate<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ValidateRequest) -> ProviderResult<Value> + Send + Sync + 'static,
    {
        self.validate = Box::new(handler);
        self
    }

    pub fn on_book<F>(mut self, handler: F) -> Self
    where
        F: Fn(&BookRequest) -> ProviderResult<Value> + Send + Sync + 'static,
    {
        self.book = Box::new(handler);
        self
    }

    pub fn on_branded_fares<F>(mut self, handler: F) -> Self
    where
        F: Fn(&BrandedFaresRequest) -> ProviderResult<Value> + Send + Sync + 'static,
    {
        self.branded = Box::new(handler);
        self
    }

    /// Snapshot of every request received so far.
    pub fn calls(&self) -> MockCalls {
        self.lock_calls().clone()
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, MockCalls> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockFlightProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlightProvider for MockFlightProvider {
    async fn search(&self, request: &ProviderRequestEnvelope) -> ProviderResult<Value> {
        self.lock_calls().searches.push(request.clone());
        (self.search)(request)
    }

    async fn validate(&self, request: &ValidateRequest) -> ProviderResult<Value> {
        self.lock_calls().validations.push(request.clone());
        (self.validate)(request)
    }

    async fn book(&self, request: &BookRequest) -> ProviderResult<Value> {
        self.lock_calls().bookings.push(request.clone());
        (self.book)(request)
    }

    async fn branded_fares(&self, request: &BrandedFaresRequest) -> ProviderResult<Value> {
        self.lock_calls().branded.push(request.clone());
        (self.branded)(request)
    }
}
