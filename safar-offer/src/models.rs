use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Fare {
    pub base_fare: f64,
    pub tax: f64,
    pub total: f64,
    #[serde(default)]
    pub currency: String,
}

/// Departure or arrival point of a segment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlightPoint {
    pub airport: String,
    #[serde(default)]
    pub date: Option<String>,
    /// Local time, `HH:MM`.
    #[serde(default)]
    pub time: Option<String>,
}

impl FlightPoint {
    pub fn hour(&self) -> Option<u32> {
        let time = self.time.as_deref()?;
        let hour: u32 = time.split(':').next()?.trim().parse().ok()?;
        (hour < 24).then_some(hour)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BaggageAllowance {
    #[serde(default)]
    pub pax_type: Option<String>,
    pub allowance: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlightSegment {
    pub marketing_airline: String,
    #[serde(default)]
    pub operating_airline: Option<String>,
    pub flight_number: String,
    pub departure: FlightPoint,
    pub arrival: FlightPoint,
    #[serde(default)]
    pub cabin: Option<String>,
    #[serde(default)]
    pub fare_basis: Option<String>,
    #[serde(default)]
    pub rbd: Option<String>,
    #[serde(default)]
    pub stops: u32,
    #[serde(default)]
    pub baggage: Vec<BaggageAllowance>,
}

/// One directional portion of the journey.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryLeg {
    pub segments: Vec<FlightSegment>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

impl ItineraryLeg {
    pub fn origin(&self) -> Option<&str> {
        self.segments.first().map(|s| s.departure.airport.as_str())
    }

    pub fn destination(&self) -> Option<&str> {
        self.segments.last().map(|s| s.arrival.airport.as_str())
    }

    pub fn departure_date(&self) -> Option<&str> {
        self.segments.first().and_then(|s| s.departure.date.as_deref())
    }
}

/// Best-effort benefit descriptions. Providers omit most of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrandBenefits {
    #[serde(default)]
    pub baggage: Option<String>,
    #[serde(default)]
    pub cabin_baggage: Option<String>,
    #[serde(default)]
    pub cancellable: Option<String>,
    #[serde(default)]
    pub date_changeable: Option<String>,
    #[serde(default)]
    pub seat_selection: Option<String>,
    #[serde(default)]
    pub meals: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub lounge: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FareBrand {
    pub brand_id: String,
    pub brand_name: String,
    pub fare: Fare,
    #[serde(default)]
    pub supplier_specific: Value,
    #[serde(flatten)]
    pub benefits: BrandBenefits,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OfferCapabilities {
    #[serde(default)]
    pub branded_fare_supported: bool,
    #[serde(default)]
    pub branded_fare_separate: bool,
    #[serde(default)]
    pub fare_rule_offered: bool,
    #[serde(default)]
    pub refundable: bool,
    #[serde(default)]
    pub instant_ticketing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrandFetchError {
    pub message: String,
}

/// A purchasable itinerary as returned by one search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlightOffer {
    pub id: String,
    pub legs: Vec<ItineraryLeg>,
    pub fare: Fare,
    pub supplier_code: String,
    /// Provider-private payload. Forwarded to validate/book untouched.
    #[serde(default)]
    pub supplier_specific: Value,
    /// `None` until brands are known, either inline or from the side channel.
    #[serde(default)]
    pub brands: Option<Vec<FareBrand>>,
    #[serde(default)]
    pub fare_info: Option<Value>,
    #[serde(flatten)]
    pub capabilities: OfferCapabilities,
    #[serde(default)]
    pub branded_fetch_error: Option<BrandFetchError>,
    /// Set once a brand has been overlaid onto the offer.
    #[serde(default)]
    pub selected_brand_id: Option<String>,
}

impl FlightOffer {
    pub fn segments(&self) -> impl Iterator<Item = &FlightSegment> {
        self.legs.iter().flat_map(|leg| leg.segments.iter())
    }

    pub fn segment_count(&self) -> usize {
        self.legs.iter().map(|leg| leg.segments.len()).sum()
    }

    /// Stops as the agent portal counts them: every segment past the first.
    pub fn stop_count(&self) -> usize {
        self.segment_count().saturating_sub(1)
    }

    pub fn marketing_airlines(&self) -> BTreeSet<&str> {
        self.segments().map(|s| s.marketing_airline.as_str()).collect()
    }

    pub fn first_departure_hour(&self) -> Option<u32> {
        self.segments().next().and_then(|s| s.departure.hour())
    }

    pub fn first_leg_duration(&self) -> Option<u32> {
        self.legs.first().and_then(|leg| leg.duration_minutes)
    }

    pub fn origin(&self) -> Option<&str> {
        self.legs.first().and_then(ItineraryLeg::origin)
    }

    pub fn destination(&self) -> Option<&str> {
        self.legs.first().and_then(ItineraryLeg::destination)
    }

    pub fn brand_count(&self) -> usize {
        self.brands.as_ref().map_or(0, Vec::len)
    }

    pub fn find_brand(&self, brand_id: &str) -> Option<&FareBrand> {
        self.brands.as_ref()?.iter().find(|b| b.brand_id == brand_id)
    }

    /// Brands must be fetched separately for this offer.
    pub fn wants_branded_fares(&self) -> bool {
        self.capabilities.branded_fare_supported && self.capabilities.branded_fare_separate
    }

    /// Brand data or a brand fetch error is already attached.
    pub fn is_brand_resolved(&self) -> bool {
        self.brands.is_some() || self.branded_fetch_error.is_some()
    }

    /// Copy of this offer priced as `brand`.
    pub fn with_brand(&self, brand: &FareBrand) -> FlightOffer {
        FlightOffer {
            fare: brand.fare.clone(),
            supplier_specific: brand.supplier_specific.clone(),
            selected_brand_id: Some(brand.brand_id.clone()),
            ..self.clone()
        }
    }
}
