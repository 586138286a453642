//! Manual multi-city assembly from independent one-way searches.

use safar_core::LegCriteria;
use safar_offer::models::{ItineraryLeg, OfferCapabilities};
use safar_offer::{Fare, FlightOffer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::brand::{resolve_brand, select_brand};
use crate::BookingError;

/// One requested leg with its one-way options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegOptions {
    pub leg: LegCriteria,
    pub options: Vec<FlightOffer>,
    #[serde(default)]
    pub selection: Option<FlightOffer>,
    /// Set when this leg's search failed. `options` is then empty.
    #[serde(default)]
    pub error: Option<String>,
}

impl LegOptions {
    pub fn new(leg: LegCriteria, options: Vec<FlightOffer>) -> Self {
        Self { leg, options, selection: None, error: None }
    }

    pub fn failed(leg: LegCriteria, error: impl Into<String>) -> Self {
        Self { leg, options: Vec::new(), selection: None, error: Some(error.into()) }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerLegOptionSet {
    pub legs: Vec<LegOptions>,
}

/// Selections merged into one bookable offer.
#[derive(Debug, Clone)]
pub struct CombinedItinerary {
    pub offer: FlightOffer,
    pub supplier_codes: Vec<String>,
    /// Brand booked on each leg, in leg order.
    pub brand_ids: Vec<String>,
}

impl PerLegOptionSet {
    pub fn new(legs: Vec<LegOptions>) -> Self {
        Self { legs }
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// Pick `offer_id` for the leg at `leg_index` (0-based), optionally
    /// priced as `brand_id`. Replaces any previous pick for that leg.
    pub fn select(&mut self, leg_index: usize, offer_id: &str, brand_id: Option<&str>) -> Result<(), BookingError> {
        let leg = self
            .legs
            .get_mut(leg_index)
            .ok_or(BookingError::UnknownLeg(leg_index + 1))?;

        let offer = leg
            .options
            .iter()
            .find(|o| o.id == offer_id)
            .cloned()
            .ok_or_else(|| BookingError::UnknownLegOption {
                leg: leg_index + 1,
                offer_id: offer_id.to_string(),
            })?;

        leg.selection = Some(match brand_id {
            Some(brand_id) => select_brand(&offer, brand_id)?,
            None => offer,
        });
        Ok(())
    }

    /// 1-based numbers of legs still lacking a selection.
    pub fn missing_legs(&self) -> Vec<usize> {
        self.legs
            .iter()
            .enumerate()
            .filter(|(_, leg)| leg.selection.is_none())
            .map(|(i, _)| i + 1)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        !self.legs.is_empty() && self.missing_legs().is_empty()
    }

    /// Merge the selections in leg order. Rejected locally unless every leg
    /// has one and every leg passes the brand gate.
    pub fn combine(&self, default_brand_id: &str) -> Result<CombinedItinerary, BookingError> {
        if self.legs.is_empty() {
            return Err(BookingError::EmptyItinerary("multi-city".to_string()));
        }
        let missing = self.missing_legs();
        if !missing.is_empty() {
            return Err(BookingError::IncompleteSelection { missing });
        }

        let (resolved, brand_ids): (Vec<FlightOffer>, Vec<String>) = self
            .legs
            .iter()
            .enumerate()
            .filter_map(|(i, leg)| leg.selection.as_ref().map(|offer| (i + 1, offer)))
            .map(|(leg, offer)| {
                resolve_brand(offer, None, default_brand_id).map_err(|e| match e {
                    BookingError::BrandSelectionRequired { offer_id, count } => {
                        BookingError::LegBrandSelectionRequired { leg, offer_id, count }
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .unzip();
        let selections: Vec<&FlightOffer> = resolved.iter().collect();

        let legs: Vec<ItineraryLeg> = selections
            .iter()
            .map(|offer| ItineraryLeg {
                segments: offer.segments().cloned().collect(),
                duration_minutes: offer
                    .legs
                    .iter()
                    .map(|leg| leg.duration_minutes)
                    .sum::<Option<u32>>(),
            })
            .collect();

        let supplier_specific: Vec<Value> = selections
            .iter()
            .flat_map(|offer| match &offer.supplier_specific {
                Value::Array(items) => items.clone(),
                Value::Null => Vec::new(),
                other => vec![other.clone()],
            })
            .collect();

        let id = format!(
            "combined:{}",
            selections.iter().map(|o| o.id.as_str()).collect::<Vec<_>>().join("+")
        );

        Ok(CombinedItinerary {
            offer: FlightOffer {
                id,
                legs,
                fare: sum_fares(&selections),
                supplier_code: selections[0].supplier_code.clone(),
                supplier_specific: Value::Array(supplier_specific),
                brands: None,
                fare_info: None,
                capabilities: OfferCapabilities::default(),
                branded_fetch_error: None,
                selected_brand_id: None,
            },
            supplier_codes: selections.iter().map(|o| o.supplier_code.clone()).collect(),
            brand_ids,
        })
    }
}

fn sum_fares(selections: &[&FlightOffer]) -> Fare {
    let currency = selections
        .iter()
        .map(|o| o.fare.currency.as_str())
        .find(|c| !c.is_empty())
        .unwrap_or_default()
        .to_string();

    if selections
        .iter()
        .any(|o| !o.fare.currency.is_empty() && o.fare.currency != currency)
    {
        tracing::warn!("Combining legs priced in different currencies, reporting {}", currency);
    }

    selections.iter().fold(
        Fare { currency, ..Fare::default() },
        |mut total, offer| {
            total.base_fare += offer.fare.base_fare;
            total.tax += offer.fare.tax;
            total.total += offer.fare.total;
            total
        },
    )
}
