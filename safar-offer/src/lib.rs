pub mod models;
pub mod parse;
pub mod normalizer;
pub mod book;
pub mod branded;
pub mod filter;

pub use models::{Fare, FareBrand, FlightOffer, FlightSegment, ItineraryLeg};
pub use normalizer::{extract_offers, normalize_offers};
pub use book::OfferBook;
pub use branded::BrandedFareAugmenter;
pub use filter::{apply_filters, OfferFilters, SortOrder, StopFilter, TimeOfDay};
