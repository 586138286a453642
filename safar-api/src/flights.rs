use axum::{extract::State, routing::post, Json, Router};
use safar_booking::{BookingConfirmation, BookingError, PerLegOptionSet};
use safar_core::criteria::{SearchCriteria, TripType};
use safar_core::passenger::PassengerRecord;
use safar_offer::filter::{available_airlines, price_bounds};
use safar_offer::{apply_filters, FlightOffer, OfferFilters};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/flights/search", post(search_flights))
        .route("/v1/flights/filter", post(filter_flights))
        .route("/v1/flights/select-brand", post(select_brand))
        .route("/v1/flights/book", post(book_flight))
        .route("/v1/flights/multi-city/book", post(book_multi_city))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFlightsRequest {
    pub criteria: SearchCriteria,
    #[serde(default)]
    pub filters: OfferFilters,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterFlightsRequest {
    pub offers: Vec<FlightOffer>,
    #[serde(default)]
    pub filters: OfferFilters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferListResponse {
    pub offers: Vec<FlightOffer>,
    /// Offers before filtering.
    pub total: usize,
    pub airlines: BTreeSet<String>,
    pub price_range: Option<PriceRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_leg: Option<PerLegOptionSet>,
}

impl OfferListResponse {
    fn new(all: &[FlightOffer], filters: &OfferFilters) -> Self {
        Self {
            offers: apply_filters(all, filters),
            total: all.len(),
            airlines: available_airlines(all),
            price_range: price_bounds(all).map(|(min, max)| PriceRange { min, max }),
            per_leg: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectBrandRequest {
    pub offer: FlightOffer,
    pub brand_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookFlightRequest {
    pub offer: FlightOffer,
    #[serde(default)]
    pub brand_id: Option<String>,
    pub trip_type: TripType,
    pub passengers: Vec<PassengerRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMultiCityRequest {
    pub per_leg: PerLegOptionSet,
    /// Offer id picked for each leg, in leg order. Overrides any selection
    /// already carried in `per_leg`.
    #[serde(default)]
    pub selections: Vec<Option<String>>,
    /// Fare brand picked for each leg, in leg order. Required on any leg whose
    /// selection offers more than one brand.
    #[serde(default)]
    pub brand_ids: Vec<Option<String>>,
    pub passengers: Vec<PassengerRecord>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/flights/search
pub async fn search_flights(
    State(state): State<AppState>,
    Json(req): Json<SearchFlightsRequest>,
) -> Result<Json<OfferListResponse>, AppError> {
    let outcome = state.engine.search(&req.criteria).await?;

    let mut response = OfferListResponse::new(outcome.offers.offers(), &req.filters);
    response.per_leg = outcome.per_leg;
    Ok(Json(response))
}

/// POST /v1/flights/filter
/// Re-filter an offer list the client already holds. No provider call.
pub async fn filter_flights(Json(req): Json<FilterFlightsRequest>) -> Json<OfferListResponse> {
    Json(OfferListResponse::new(&req.offers, &req.filters))
}

/// POST /v1/flights/select-brand
pub async fn select_brand(
    State(state): State<AppState>,
    Json(req): Json<SelectBrandRequest>,
) -> Result<Json<FlightOffer>, AppError> {
    let offer = state.engine.select_brand(&req.offer, &req.brand_id)?;
    Ok(Json(offer))
}

/// POST /v1/flights/book
/// Full validate → book saga for one offer.
pub async fn book_flight(
    State(state): State<AppState>,
    Json(req): Json<BookFlightRequest>,
) -> Result<Json<BookingConfirmation>, AppError> {
    let confirmation = state
        .engine
        .book(&req.offer, req.brand_id.as_deref(), req.trip_type, &req.passengers)
        .await?;
    Ok(Json(confirmation))
}

/// POST /v1/flights/multi-city/book
/// Combine per-leg selections, then validate and book them as one itinerary.
pub async fn book_multi_city(
    State(state): State<AppState>,
    Json(req): Json<BookMultiCityRequest>,
) -> Result<Json<BookingConfirmation>, AppError> {
    let mut per_leg = req.per_leg;
    let picks = req.selections.len().max(req.brand_ids.len());
    for leg_index in 0..picks {
        let offer_id = req.selections.get(leg_index).cloned().flatten();
        let brand_id = req.brand_ids.get(leg_index).cloned().flatten();
        if offer_id.is_none() && brand_id.is_none() {
            continue;
        }

        // A brand on its own re-prices the offer already selected for that leg.
        let offer_id = offer_id.or_else(|| {
            per_leg
                .legs
                .get(leg_index)
                .and_then(|leg| leg.selection.as_ref())
                .map(|offer| offer.id.clone())
        });
        match offer_id {
            Some(offer_id) => per_leg.select(leg_index, &offer_id, brand_id.as_deref())?,
            None => return Err(BookingError::IncompleteSelection { missing: vec![leg_index + 1] }.into()),
        }
    }

    let confirmation = state.engine.book_combined(&per_leg, &req.passengers).await?;
    Ok(Json(confirmation))
}
