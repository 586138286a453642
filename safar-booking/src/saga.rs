//! Validate → book saga.
//!
//! Each state is its own type and each transition consumes the previous
//! state, so a sealed token can only be spent once and a booking can only be
//! attempted after a successful validation.

use safar_core::criteria::TripType;
use safar_core::envelope::{BookRequest, ValidateRequest};
use safar_core::passenger::PassengerRecord;
use safar_core::{CoreError, FlightProvider};
use safar_offer::parse::parse_fare;
use safar_offer::FlightOffer;
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::brand::resolve_brand;
use crate::models::{BookingConfirmation, BookingSettings, FlightData, OdPair, SagaState, SealedToken};
use crate::multicity::CombinedItinerary;
use crate::payload::{book_travelers, validate_summary, PaxSummary};
use crate::BookingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaStage {
    Build,
    Validate,
    Book,
}

impl fmt::Display for SagaStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SagaStage::Build => write!(f, "build"),
            SagaStage::Validate => write!(f, "validate"),
            SagaStage::Book => write!(f, "book"),
        }
    }
}

/// Terminal failure of one booking attempt.
#[derive(Debug, thiserror::Error)]
#[error("Booking {stage} step failed: {error}")]
pub struct SagaFailure {
    pub saga_id: Uuid,
    pub stage: SagaStage,
    #[source]
    pub error: BookingError,
}

impl SagaFailure {
    pub fn new(saga_id: Uuid, stage: SagaStage, error: impl Into<BookingError>) -> Self {
        Self { saga_id, stage, error: error.into() }
    }

    pub fn state(&self) -> SagaState {
        SagaState::Failed
    }
}

// ============================================================================
// Built
// ============================================================================

/// Itinerary priced and branded, ready to validate.
#[derive(Debug)]
pub struct BuiltBooking {
    saga_id: Uuid,
    offer: FlightOffer,
    brand_id: String,
    leg_brand_ids: Vec<String>,
    supplier_codes: Vec<String>,
    trip_type: TripType,
}

impl BuiltBooking {
    /// Runs the brand gate. `brand` is the agent's explicit choice, if any.
    pub fn new(
        offer: &FlightOffer,
        brand: Option<&str>,
        trip_type: TripType,
        settings: &BookingSettings,
    ) -> Result<Self, BookingError> {
        if offer.segment_count() == 0 {
            return Err(BookingError::EmptyItinerary(offer.id.clone()));
        }
        let (offer, brand_id) = resolve_brand(offer, brand, &settings.default_brand_id)?;
        let supplier_codes = vec![offer.supplier_code.clone()];

        Ok(Self {
            saga_id: Uuid::new_v4(),
            offer,
            brand_id,
            leg_brand_ids: Vec::new(),
            supplier_codes,
            trip_type,
        })
    }

    /// Multi-city itinerary assembled from per-leg selections. Each leg has
    /// already passed the brand gate; the first leg's brand is the headline.
    pub fn combined(itinerary: CombinedItinerary, settings: &BookingSettings) -> Result<Self, BookingError> {
        if itinerary.offer.segment_count() == 0 {
            return Err(BookingError::EmptyItinerary(itinerary.offer.id.clone()));
        }
        let brand_id = itinerary
            .brand_ids
            .first()
            .cloned()
            .unwrap_or_else(|| settings.default_brand_id.clone());

        Ok(Self {
            saga_id: Uuid::new_v4(),
            offer: itinerary.offer,
            brand_id,
            leg_brand_ids: itinerary.brand_ids,
            supplier_codes: itinerary.supplier_codes,
            trip_type: TripType::MultiCity,
        })
    }

    pub fn saga_id(&self) -> Uuid {
        self.saga_id
    }

    pub fn state(&self) -> SagaState {
        SagaState::Built
    }

    pub fn offer(&self) -> &FlightOffer {
        &self.offer
    }

    pub fn brand_id(&self) -> &str {
        &self.brand_id
    }

    pub fn flight_data(&self, pax: PaxSummary) -> FlightData {
        let od_pairs: Vec<OdPair> = self
            .offer
            .legs
            .iter()
            .filter_map(|leg| {
                Some(OdPair {
                    origin: leg.origin()?.to_string(),
                    destination: leg.destination()?.to_string(),
                    departure_date: leg.departure_date().map(str::to_string),
                })
            })
            .collect();

        let origin = od_pairs.first().map(|od| od.origin.clone()).unwrap_or_default();
        let destination = od_pairs.first().map(|od| od.destination.clone()).unwrap_or_default();

        FlightData {
            offer_id: self.offer.id.clone(),
            legs: self.offer.legs.clone(),
            fare: self.offer.fare.clone(),
            brand_id: self.brand_id.clone(),
            supplier_codes: self.supplier_codes.clone(),
            supplier_specific: self.offer.supplier_specific.clone(),
            origin,
            destination,
            od_pairs,
            pax,
            trip_type: self.trip_type.code().to_string(),
            leg_brand_ids: self.leg_brand_ids.clone(),
        }
    }

    /// Built → Validated. The response must carry a sealed token. Pricing
    /// the provider returns with it replaces the pre-validate values.
    pub async fn validate(
        self,
        provider: &dyn FlightProvider,
        pax: PaxSummary,
        token: Option<&str>,
    ) -> Result<ValidatedBooking, SagaFailure> {
        let saga_id = self.saga_id;
        let fail = |error: BookingError| {
            tracing::error!(%saga_id, "Validation failed: {}", error);
            SagaFailure::new(saga_id, SagaStage::Validate, error)
        };

        if pax.adt == 0 {
            return Err(fail(CoreError::ValidationError("At least one adult passenger is required".into()).into()));
        }

        let mut flight_data = self.flight_data(pax);
        tracing::info!(
            %saga_id,
            offer_id = %flight_data.offer_id,
            brand_id = %flight_data.brand_id,
            "Validating itinerary, fare {} {}",
            flight_data.fare.total,
            flight_data.fare.currency
        );

        let request = ValidateRequest {
            flight_data: serde_json::to_value(&flight_data).map_err(|e| fail(e.into()))?,
            sealed: None,
            token: token.map(str::to_string),
        };
        let response = provider.validate(&request).await.map_err(|e| fail(e.into()))?;

        let sealed = response
            .get("sealed")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(|s| SealedToken::new(s.to_string()))
            .ok_or_else(|| fail(BookingError::MissingSealedToken))?;

        apply_validated_pricing(&mut flight_data, &response);
        tracing::info!(%saga_id, "Itinerary validated, fare now {}", flight_data.fare.total);

        Ok(ValidatedBooking { saga_id, flight_data, sealed })
    }
}

/// Prefer the fare and supplier payload echoed by validate over our own.
fn apply_validated_pricing(flight_data: &mut FlightData, response: &Value) {
    let echoed = response
        .get("flightData")
        .filter(|v| v.is_object())
        .unwrap_or(response);

    if let Some(fare) = echoed.get("fare").filter(|v| v.is_object()) {
        let mut validated = parse_fare(&serde_json::json!({ "fare": fare }));
        if validated.currency.is_empty() {
            validated.currency = flight_data.fare.currency.clone();
        }
        flight_data.fare = validated;
    }
    if let Some(supplier_specific) = echoed.get("supplierSpecific").filter(|v| !v.is_null()) {
        flight_data.supplier_specific = supplier_specific.clone();
    }
}

// ============================================================================
// Validated
// ============================================================================

/// Validated itinerary holding its single-use sealed token.
#[derive(Debug)]
pub struct ValidatedBooking {
    saga_id: Uuid,
    flight_data: FlightData,
    sealed: SealedToken,
}

impl ValidatedBooking {
    pub fn saga_id(&self) -> Uuid {
        self.saga_id
    }

    pub fn state(&self) -> SagaState {
        SagaState::Validated
    }

    pub fn flight_data(&self) -> &FlightData {
        &self.flight_data
    }

    pub fn sealed(&self) -> &SealedToken {
        &self.sealed
    }

    /// Validated → Booked. Success needs a truthy success flag and a PNR.
    pub async fn book(
        self,
        provider: &dyn FlightProvider,
        passengers: &[PassengerRecord],
        token: Option<&str>,
    ) -> Result<BookingConfirmation, SagaFailure> {
        let saga_id = self.saga_id;
        let fail = |error: BookingError| {
            tracing::error!(%saga_id, "Booking failed: {}", error);
            SagaFailure::new(saga_id, SagaStage::Book, error)
        };

        let summary = validate_summary(passengers);
        if summary != self.flight_data.pax {
            return Err(fail(
                CoreError::ValidationError(format!(
                    "Passenger list ({} ADT, {} CHD, {} INF) does not match the validated fare ({} ADT, {} CHD, {} INF)",
                    summary.adt, summary.chd, summary.inf,
                    self.flight_data.pax.adt, self.flight_data.pax.chd, self.flight_data.pax.inf,
                ))
                .into(),
            ));
        }
        let travelers = book_travelers(passengers).map_err(|e| fail(e.into()))?;

        let request = BookRequest {
            flight_data: serde_json::to_value(&self.flight_data).map_err(|e| fail(e.into()))?,
            passengers: travelers,
            sealed: self.sealed.into_inner(),
            token: token.map(str::to_string),
        };
        tracing::info!(%saga_id, offer_id = %self.flight_data.offer_id, "Booking {} passengers", request.passengers.len());

        let response = provider.book(&request).await.map_err(|e| fail(e.into()))?;
        let confirmation = confirmation_from(&response).map_err(fail)?;

        tracing::info!(%saga_id, pnr = %confirmation.pnr, "Booking confirmed");
        Ok(confirmation)
    }
}

fn confirmation_from(response: &Value) -> Result<BookingConfirmation, BookingError> {
    let success = response.get("success").is_some_and(is_truthy);
    let pnr = text(response, &["pnr", "PNR"]);

    match (success, pnr) {
        (true, Some(pnr)) => Ok(BookingConfirmation {
            pnr,
            booking_ref_id: text(response, &["bookingRefId", "booking_ref_id", "bookingId"]),
            status: text(response, &["status"]),
            raw: response.clone(),
        }),
        _ => Err(BookingError::BookingRejected {
            message: text(response, &["message", "detail", "error"])
                .unwrap_or_else(|| "Booking was not confirmed by the provider".to_string()),
            detail: response.clone(),
        }),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        Value::String(s) => !s.is_empty() && s != "false",
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn text(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|key| raw.get(*key)).find_map(|v| match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
