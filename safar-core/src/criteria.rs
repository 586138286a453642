use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

pub const MAX_MULTI_CITY_LEGS: usize = 6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TripType {
    OneWay,
    Return,
    MultiCity,
}

impl TripType {
    /// One-letter code the provider expects in request envelopes.
    pub fn code(self) -> &'static str {
        match self {
            TripType::OneWay => "O",
            TripType::Return => "R",
            TripType::MultiCity => "M",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PassengerCounts {
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants: u32,
}

fn default_adults() -> u32 {
    1
}

impl Default for PassengerCounts {
    fn default() -> Self {
        Self { adults: 1, children: 0, infants: 0 }
    }
}

impl PassengerCounts {
    pub fn new(adults: u32, children: u32, infants: u32) -> Self {
        Self { adults, children, infants }
    }

    pub fn total(&self) -> u32 {
        self.adults + self.children + self.infants
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LegCriteria {
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate, // Just date, departure time is not a search input
}

impl LegCriteria {
    pub fn new(origin: &str, destination: &str, date: NaiveDate) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            date,
        }
    }
}

/// Route shape of a search. The variant decides the trip type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "tripType", rename_all_fields = "camelCase")]
pub enum Itinerary {
    OneWay {
        origin: String,
        destination: String,
        departure_date: NaiveDate,
    },
    Return {
        origin: String,
        destination: String,
        departure_date: NaiveDate,
        return_date: NaiveDate,
    },
    MultiCity {
        legs: Vec<LegCriteria>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    #[serde(flatten)]
    pub itinerary: Itinerary,
    #[serde(default)]
    pub passengers: PassengerCounts,
    #[serde(default = "default_cabin")]
    pub cabin_class: String,
}

fn default_cabin() -> String {
    "Economy".to_string()
}

impl SearchCriteria {
    pub fn one_way(origin: &str, destination: &str, departure_date: NaiveDate) -> Self {
        Self::from_itinerary(Itinerary::OneWay {
            origin: origin.to_string(),
            destination: destination.to_string(),
            departure_date,
        })
    }

    pub fn round_trip(
        origin: &str,
        destination: &str,
        departure_date: NaiveDate,
        return_date: NaiveDate,
    ) -> Self {
        Self::from_itinerary(Itinerary::Return {
            origin: origin.to_string(),
            destination: destination.to_string(),
            departure_date,
            return_date,
        })
    }

    pub fn multi_city(legs: Vec<LegCriteria>) -> Self {
        Self::from_itinerary(Itinerary::MultiCity { legs })
    }

    fn from_itinerary(itinerary: Itinerary) -> Self {
        Self {
            itinerary,
            passengers: PassengerCounts::default(),
            cabin_class: default_cabin(),
        }
    }

    pub fn with_passengers(mut self, passengers: PassengerCounts) -> Self {
        self.passengers = passengers;
        self
    }

    pub fn with_cabin(mut self, cabin_class: &str) -> Self {
        self.cabin_class = cabin_class.to_string();
        self
    }

    pub fn trip_type(&self) -> TripType {
        match self.itinerary {
            Itinerary::OneWay { .. } => TripType::OneWay,
            Itinerary::Return { .. } => TripType::Return,
            Itinerary::MultiCity { .. } => TripType::MultiCity,
        }
    }

    /// Ordered origin/destination/date triples of the trip. A return trip
    /// yields the outbound leg followed by its mirror on the return date.
    pub fn legs(&self) -> Vec<LegCriteria> {
        match &self.itinerary {
            Itinerary::OneWay { origin, destination, departure_date } => {
                vec![LegCriteria::new(origin, destination, *departure_date)]
            }
            Itinerary::Return { origin, destination, departure_date, return_date } => vec![
                LegCriteria::new(origin, destination, *departure_date),
                LegCriteria::new(destination, origin, *return_date),
            ],
            Itinerary::MultiCity { legs } => legs.clone(),
        }
    }

    /// One-way search for a single leg, keeping passengers and cabin.
    pub fn one_way_for_leg(&self, leg: &LegCriteria) -> SearchCriteria {
        SearchCriteria {
            itinerary: Itinerary::OneWay {
                origin: leg.origin.clone(),
                destination: leg.destination.clone(),
                departure_date: leg.date,
            },
            passengers: self.passengers,
            cabin_class: self.cabin_class.clone(),
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.passengers.adults < 1 {
            return Err(CoreError::ValidationError(
                "At least one adult passenger is required".to_string(),
            ));
        }

        match &self.itinerary {
            Itinerary::OneWay { origin, destination, .. } => {
                validate_pair(1, origin, destination)?;
            }
            Itinerary::Return { origin, destination, departure_date, return_date } => {
                validate_pair(1, origin, destination)?;
                if return_date < departure_date {
                    return Err(CoreError::ValidationError(
                        "Return date cannot be before the departure date".to_string(),
                    ));
                }
            }
            Itinerary::MultiCity { legs } => {
                if legs.is_empty() || legs.len() > MAX_MULTI_CITY_LEGS {
                    return Err(CoreError::ValidationError(format!(
                        "Multi-city trips need between 1 and {} legs, got {}",
                        MAX_MULTI_CITY_LEGS,
                        legs.len()
                    )));
                }
                for (i, leg) in legs.iter().enumerate() {
                    validate_pair(i + 1, &leg.origin, &leg.destination)?;
                }
            }
        }
        Ok(())
    }
}

fn validate_pair(leg_no: usize, origin: &str, destination: &str) -> CoreResult<()> {
    for (label, code) in [("origin", origin), ("destination", destination)] {
        if !is_airport_code(code) {
            return Err(CoreError::ValidationError(format!(
                "Leg {}: {} '{}' is not a 3-letter airport code",
                leg_no, label, code
            )));
        }
    }
    Ok(())
}

fn is_airport_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}
