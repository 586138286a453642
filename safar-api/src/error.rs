use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use safar_booking::{BookingError, SagaFailure};
use safar_core::ProviderError;
use serde_json::{json, Value};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error(transparent)]
    Saga(#[from] SagaFailure),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Booking(err) => {
                let (status, detail) = classify(err);
                (status, json!({ "error": err.to_string(), "detail": detail }))
            }
            AppError::Saga(failure) => {
                let (status, detail) = classify(&failure.error);
                (
                    status,
                    json!({
                        "error": failure.error.to_string(),
                        "detail": detail,
                        "stage": failure.stage.to_string(),
                        "sagaId": failure.saga_id,
                    }),
                )
            }
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(body)).into_response()
    }
}

/// Status code and raw provider detail for a booking error.
fn classify(err: &BookingError) -> (StatusCode, Value) {
    match err {
        BookingError::InvalidInput(_)
        | BookingError::EmptyItinerary(_)
        | BookingError::IncompleteSelection { .. }
        | BookingError::UnknownLeg(_)
        | BookingError::UnknownLegOption { .. }
        | BookingError::UnknownBrand { .. } => (StatusCode::BAD_REQUEST, Value::Null),
        BookingError::BrandSelectionRequired { .. } | BookingError::LegBrandSelectionRequired { .. } => {
            (StatusCode::CONFLICT, Value::Null)
        }
        BookingError::MissingSealedToken => (StatusCode::BAD_GATEWAY, Value::Null),
        BookingError::BookingRejected { detail, .. } => (StatusCode::BAD_GATEWAY, detail.clone()),
        BookingError::Provider(ProviderError::Timeout { .. }) => (StatusCode::GATEWAY_TIMEOUT, Value::Null),
        BookingError::Provider(e) => (StatusCode::BAD_GATEWAY, e.body().cloned().unwrap_or(Value::Null)),
        BookingError::Encoding(_) => (StatusCode::INTERNAL_SERVER_ERROR, Value::Null),
    }
}
