use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::FlightOffer;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StopFilter {
    #[default]
    All,
    Nonstop,
    Onestop,
}

impl StopFilter {
    fn accepts(self, stops: usize) -> bool {
        match self {
            StopFilter::All => true,
            StopFilter::Nonstop => stops == 0,
            StopFilter::Onestop => stops == 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    /// morning 06–12, afternoon 12–18, evening 18–24, night 00–06
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=5 => TimeOfDay::Night,
            6..=11 => TimeOfDay::Morning,
            12..=17 => TimeOfDay::Afternoon,
            _ => TimeOfDay::Evening,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Provider order.
    #[default]
    Relevance,
    Price,
    Duration,
}

/// Independent, AND-combined filters. The default value filters nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OfferFilters {
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub stops: StopFilter,
    /// Marketing carrier codes. Empty means any airline.
    #[serde(default)]
    pub airlines: BTreeSet<String>,
    /// Departure buckets of the first segment. Empty means any time.
    #[serde(default)]
    pub departure_times: BTreeSet<TimeOfDay>,
    #[serde(default)]
    pub sort: SortOrder,
}

impl OfferFilters {
    pub fn matches(&self, offer: &FlightOffer) -> bool {
        let total = offer.fare.total;
        if self.min_price.is_some_and(|min| total < min) || self.max_price.is_some_and(|max| total > max) {
            return false;
        }

        if !self.stops.accepts(offer.stop_count()) {
            return false;
        }

        if !self.airlines.is_empty() {
            let carriers = offer.marketing_airlines();
            let any = carriers
                .iter()
                .any(|code| self.airlines.iter().any(|wanted| wanted.eq_ignore_ascii_case(code)));
            if !any {
                return false;
            }
        }

        if !self.departure_times.is_empty() {
            match offer.first_departure_hour() {
                Some(hour) if self.departure_times.contains(&TimeOfDay::from_hour(hour)) => {}
                _ => return false,
            }
        }

        true
    }
}

/// Filtered and sorted copy of `offers`. The input slice is not touched.
pub fn apply_filters(offers: &[FlightOffer], filters: &OfferFilters) -> Vec<FlightOffer> {
    let mut view: Vec<FlightOffer> = offers.iter().filter(|o| filters.matches(o)).cloned().collect();

    // Both sorts are stable, equal keys keep provider order.
    match filters.sort {
        SortOrder::Relevance => {}
        SortOrder::Price => view.sort_by(|a, b| a.fare.total.total_cmp(&b.fare.total)),
        SortOrder::Duration => view.sort_by_key(|o| o.first_leg_duration().unwrap_or(u32::MAX)),
    }
    view
}

/// Every marketing carrier present in the result set, for the airline facet.
pub fn available_airlines(offers: &[FlightOffer]) -> BTreeSet<String> {
    offers
        .iter()
        .flat_map(|o| o.marketing_airlines())
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lowest and highest `fare.total`, for the price slider.
pub fn price_bounds(offers: &[FlightOffer]) -> Option<(f64, f64)> {
    offers.iter().map(|o| o.fare.total).fold(None, |bounds, total| match bounds {
        None => Some((total, total)),
        Some((lo, hi)) => Some((lo.min(total), hi.max(total))),
    })
}
