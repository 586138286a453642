use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::criteria::SearchCriteria;
use crate::passenger::BookingTraveler;

// ============================================================================
// Search
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OriginDestination {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
}

/// Canonical search request sent to the flight provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRequestEnvelope {
    pub trip_type: String,
    pub cabin_class: String,
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
    pub total_passengers: u32,
    pub origin_destinations: Vec<OriginDestination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Fixed cabin lookup. Unknown labels fall back to economy.
pub fn cabin_code(cabin_class: &str) -> &'static str {
    match cabin_class.trim() {
        "Economy" => "Y",
        "Premium Economy" => "W",
        "Business" => "C",
        "First" => "F",
        _ => "Y",
    }
}

/// Build the provider envelope for a search. `token` is optional because some
/// provider policies allow anonymous search.
pub fn build_search_request(criteria: &SearchCriteria, token: Option<&str>) -> ProviderRequestEnvelope {
    let origin_destinations = criteria
        .legs()
        .into_iter()
        .map(|leg| OriginDestination {
            origin: leg.origin,
            destination: leg.destination,
            departure_date: leg.date,
        })
        .collect();

    ProviderRequestEnvelope {
        trip_type: criteria.trip_type().code().to_string(),
        cabin_class: cabin_code(&criteria.cabin_class).to_string(),
        adults: criteria.passengers.adults,
        children: criteria.passengers.children,
        infants: criteria.passengers.infants,
        total_passengers: criteria.passengers.total(),
        origin_destinations,
        token: token.map(str::to_string),
    }
}

// ============================================================================
// Validate / Book / Branded fares
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub flight_data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sealed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    pub flight_data: Value,
    pub passengers: Vec<BookingTraveler>,
    pub sealed: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandedFaresRequest {
    pub flight_data: Value,
    pub origin: String,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}
