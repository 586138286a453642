pub mod models;
pub mod payload;
pub mod brand;
pub mod saga;
pub mod multicity;
pub mod engine;

pub use models::{BookingConfirmation, BookingSettings, FlightData, SagaState, SealedToken};
pub use payload::PaxSummary;
pub use saga::{BuiltBooking, SagaFailure, SagaStage, ValidatedBooking};
pub use multicity::{CombinedItinerary, LegOptions, PerLegOptionSet};
pub use engine::{FlightEngine, SearchOutcome};

use safar_core::{CoreError, ProviderError};

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error(transparent)]
    InvalidInput(#[from] CoreError),

    #[error("Offer {offer_id} has {count} fare brands. Choose one before booking.")]
    BrandSelectionRequired { offer_id: String, count: usize },

    #[error("Leg {leg}: offer {offer_id} has {count} fare brands. Choose one before booking.")]
    LegBrandSelectionRequired { leg: usize, offer_id: String, count: usize },

    #[error("Brand {brand_id} is not offered on {offer_id}")]
    UnknownBrand { offer_id: String, brand_id: String },

    #[error("Offer {0} has no flight segments")]
    EmptyItinerary(String),

    #[error("Please select a flight for leg(s) {} before continuing.", join_legs(.missing))]
    IncompleteSelection { missing: Vec<usize> },

    #[error("Leg {0} is not part of this search")]
    UnknownLeg(usize),

    #[error("Offer {offer_id} is not an option for leg {leg}")]
    UnknownLegOption { leg: usize, offer_id: String },

    #[error("Failed to get sealed token from validation.")]
    MissingSealedToken,

    #[error("Booking failed: {message}")]
    BookingRejected { message: String, detail: serde_json::Value },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Could not encode provider payload: {0}")]
    Encoding(#[from] serde_json::Error),
}

fn join_legs(legs: &[usize]) -> String {
    legs.iter().map(usize::to_string).collect::<Vec<_>>().join(", ")
}
