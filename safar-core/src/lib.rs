pub mod criteria;
pub mod envelope;
pub mod passenger;
pub mod provider;
pub mod auth;

pub use criteria::{LegCriteria, PassengerCounts, SearchCriteria, TripType};
pub use envelope::{build_search_request, ProviderRequestEnvelope};
pub use provider::{FlightProvider, ProviderError, ProviderResult};
pub use auth::{AuthContext, TokenSource};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Passenger {index} is incomplete: {reason}")]
    IncompletePassenger { index: usize, reason: String },
}

pub type CoreResult<T> = Result<T, CoreError>;
