use futures_util::future::join_all;
use safar_core::criteria::{LegCriteria, SearchCriteria, TripType};
use safar_core::passenger::PassengerRecord;
use safar_core::{build_search_request, AuthContext, FlightProvider, ProviderResult};
use safar_offer::{normalize_offers, BrandedFareAugmenter, FlightOffer, OfferBook};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::brand;
use crate::models::{BookingConfirmation, BookingSettings};
use crate::multicity::{LegOptions, PerLegOptionSet};
use crate::payload::{book_travelers, validate_summary, PaxSummary};
use crate::saga::{BuiltBooking, SagaFailure, SagaStage, ValidatedBooking};
use crate::BookingError;

/// Result of one search action. A new search replaces the previous outcome.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub criteria: SearchCriteria,
    pub offers: OfferBook,
    /// Present only when a multi-city search fell back to per-leg searches.
    pub per_leg: Option<PerLegOptionSet>,
}

/// Entry point for the UI collaborator: search, brand selection and the
/// validate → book saga over a single provider.
pub struct FlightEngine {
    provider: Arc<dyn FlightProvider>,
    auth: Arc<AuthContext>,
    augmenter: BrandedFareAugmenter,
    settings: BookingSettings,
}

impl FlightEngine {
    pub fn new(provider: Arc<dyn FlightProvider>, auth: Arc<AuthContext>, settings: BookingSettings) -> Self {
        Self {
            augmenter: BrandedFareAugmenter::new(provider.clone()),
            provider,
            auth,
            settings,
        }
    }

    pub fn settings(&self) -> &BookingSettings {
        &self.settings
    }

    // ========================================================================
    // Search
    // ========================================================================

    pub async fn search(&self, criteria: &SearchCriteria) -> Result<SearchOutcome, BookingError> {
        criteria.validate()?;
        let token = self.auth.ensure_token().await?;
        let token = token.as_deref();

        let legs = criteria.legs();
        tracing::info!(
            trip_type = criteria.trip_type().code(),
            "Searching {} leg(s) for {} passenger(s)",
            legs.len(),
            criteria.passengers.total()
        );

        let offers = self.search_offers(criteria, token).await?;
        let offers = match legs.first() {
            Some(first) => self.augmenter.augment(&offers, &first.origin, &first.destination, token).await,
            None => offers,
        };

        if criteria.trip_type() != TripType::MultiCity || !offers.is_empty() {
            tracing::info!("Search returned {} offers", offers.len());
            return Ok(SearchOutcome { criteria: criteria.clone(), offers, per_leg: None });
        }

        tracing::info!("Multi-city search returned nothing, searching {} legs separately", legs.len());
        let per_leg = join_all(legs.into_iter().map(|leg| self.search_leg(criteria, leg, token))).await;

        let failed = per_leg.iter().filter(|l| l.error.is_some()).count();
        tracing::info!("Per-leg searches finished ({} failed)", failed);

        Ok(SearchOutcome {
            criteria: criteria.clone(),
            offers,
            per_leg: Some(PerLegOptionSet::new(per_leg)),
        })
    }

    async fn search_offers(&self, criteria: &SearchCriteria, token: Option<&str>) -> ProviderResult<OfferBook> {
        let envelope = build_search_request(criteria, token);
        let raw = self.provider.search(&envelope).await?;
        Ok(OfferBook::new(normalize_offers(&raw, &self.settings.default_supplier_code)))
    }

    async fn search_leg(&self, criteria: &SearchCriteria, leg: LegCriteria, token: Option<&str>) -> LegOptions {
        let one_way = criteria.one_way_for_leg(&leg);
        match self.search_offers(&one_way, token).await {
            Ok(offers) => {
                let offers = self.augmenter.augment(&offers, &leg.origin, &leg.destination, token).await;
                LegOptions::new(leg, offers.into_offers())
            }
            Err(e) => {
                tracing::warn!("Search for leg {}-{} failed: {}", leg.origin, leg.destination, e);
                LegOptions::failed(leg, e.to_string())
            }
        }
    }

    // ========================================================================
    // Brand selection
    // ========================================================================

    pub fn select_brand(&self, offer: &FlightOffer, brand_id: &str) -> Result<FlightOffer, BookingError> {
        brand::select_brand(offer, brand_id)
    }

    // ========================================================================
    // Booking
    // ========================================================================

    /// Brand gate, validate and book for one offer.
    pub async fn book(
        &self,
        offer: &FlightOffer,
        brand_id: Option<&str>,
        trip_type: TripType,
        passengers: &[PassengerRecord],
    ) -> Result<BookingConfirmation, SagaFailure> {
        check_passengers(passengers)?;
        let built = BuiltBooking::new(offer, brand_id, trip_type, &self.settings)
            .map_err(|e| SagaFailure::new(Uuid::new_v4(), SagaStage::Build, e))?;

        let span = tracing::info_span!("booking", saga_id = %built.saga_id());
        async move {
            let validated = self.validate_built(built, validate_summary(passengers)).await?;
            self.complete(validated, passengers).await
        }
        .instrument(span)
        .await
    }

    /// Combine the per-leg selections and validate them as one itinerary.
    /// Nothing is sent unless every leg has a selection.
    pub async fn validate_combined(
        &self,
        set: &PerLegOptionSet,
        pax: PaxSummary,
    ) -> Result<ValidatedBooking, SagaFailure> {
        let built = set
            .combine(&self.settings.default_brand_id)
            .and_then(|combined| BuiltBooking::combined(combined, &self.settings))
            .map_err(|e| SagaFailure::new(Uuid::new_v4(), SagaStage::Build, e))?;

        let span = tracing::info_span!("booking", saga_id = %built.saga_id());
        self.validate_built(built, pax).instrument(span).await
    }

    /// Book a validated itinerary, spending its sealed token.
    pub async fn complete(
        &self,
        validated: ValidatedBooking,
        passengers: &[PassengerRecord],
    ) -> Result<BookingConfirmation, SagaFailure> {
        let saga_id = validated.saga_id();
        let token = self
            .auth
            .ensure_token()
            .await
            .map_err(|e| SagaFailure::new(saga_id, SagaStage::Book, e))?;

        validated.book(self.provider.as_ref(), passengers, token.as_deref()).await
    }

    pub async fn book_combined(
        &self,
        set: &PerLegOptionSet,
        passengers: &[PassengerRecord],
    ) -> Result<BookingConfirmation, SagaFailure> {
        check_passengers(passengers)?;
        let validated = self.validate_combined(set, validate_summary(passengers)).await?;

        let span = tracing::info_span!("booking", saga_id = %validated.saga_id());
        self.complete(validated, passengers).instrument(span).await
    }

    async fn validate_built(&self, built: BuiltBooking, pax: PaxSummary) -> Result<ValidatedBooking, SagaFailure> {
        let saga_id = built.saga_id();
        let token = self
            .auth
            .ensure_token()
            .await
            .map_err(|e| SagaFailure::new(saga_id, SagaStage::Validate, e))?;

        built.validate(self.provider.as_ref(), pax, token.as_deref()).await
    }
}

/// Incomplete passenger data is rejected before any provider call.
fn check_passengers(passengers: &[PassengerRecord]) -> Result<(), SagaFailure> {
    book_travelers(passengers)
        .map(|_| ())
        .map_err(|e| SagaFailure::new(Uuid::new_v4(), SagaStage::Build, e))
}
