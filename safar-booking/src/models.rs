use safar_offer::{Fare, ItineraryLeg};
use safar_shared::Masked;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::payload::PaxSummary;

/// Saga states. `Booked` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SagaState {
    Built,
    Validated,
    Booked,
    Failed,
}

/// Provider-issued authorization binding a validated fare to one booking
/// call. Not `Clone`: booking consumes it.
#[derive(Debug)]
pub struct SealedToken(Masked<String>);

impl SealedToken {
    pub(crate) fn new(value: String) -> Self {
        Self(Masked::new(value))
    }

    pub fn as_str(&self) -> &str {
        self.0.expose()
    }

    pub(crate) fn into_inner(self) -> String {
        self.0.into_inner()
    }
}

/// Origin/destination of one leg, rebuilt from its segments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OdPair {
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub departure_date: Option<String>,
}

/// The itinerary payload sent to validate and, with validated pricing, to book.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlightData {
    pub offer_id: String,
    pub legs: Vec<ItineraryLeg>,
    pub fare: Fare,
    pub brand_id: String,
    pub supplier_codes: Vec<String>,
    /// A single object for plain offers, a list for combined multi-city ones.
    pub supplier_specific: Value,
    pub origin: String,
    pub destination: String,
    pub od_pairs: Vec<OdPair>,
    pub pax: PaxSummary,
    pub trip_type: String,
    /// Brand booked on each leg of a combined multi-city itinerary.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub leg_brand_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub pnr: String,
    pub booking_ref_id: Option<String>,
    pub status: Option<String>,
    /// Full provider response for the voucher/invoice collaborators.
    pub raw: Value,
}

impl BookingConfirmation {
    /// A confirmation only exists once the provider accepted the booking.
    pub fn state(&self) -> SagaState {
        SagaState::Booked
    }
}

/// Provider defaults that must come from configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BookingSettings {
    /// Used when an offer does not name its supplier.
    pub default_supplier_code: String,
    /// Brand id sent when an offer has no brands at all.
    pub default_brand_id: String,
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self {
            default_supplier_code: "11".to_string(),
            default_brand_id: "DEFAULT".to_string(),
        }
    }
}
