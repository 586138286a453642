use crate::models::FlightOffer;
use std::collections::HashMap;

/// Offers of one search, in provider order, indexed by id.
///
/// The book is never edited in place. Annotating an offer produces a new
/// book, so any filtered view taken earlier stays valid.
#[derive(Debug, Clone, Default)]
pub struct OfferBook {
    offers: Vec<FlightOffer>,
    index: HashMap<String, usize>,
}

impl OfferBook {
    /// Build a book from normalized offers. Offers whose id was already
    /// seen get a positional suffix so ids stay unique.
    pub fn new(offers: Vec<FlightOffer>) -> Self {
        let mut index = HashMap::with_capacity(offers.len());
        let mut unique = Vec::with_capacity(offers.len());

        for (position, mut offer) in offers.into_iter().enumerate() {
            if index.contains_key(&offer.id) {
                let renamed = format!("{}#{}", offer.id, position + 1);
                tracing::warn!("Duplicate offer id {} renamed to {}", offer.id, renamed);
                offer.id = renamed;
            }
            index.insert(offer.id.clone(), unique.len());
            unique.push(offer);
        }

        Self { offers: unique, index }
    }

    pub fn get(&self, offer_id: &str) -> Option<&FlightOffer> {
        self.index.get(offer_id).map(|&i| &self.offers[i])
    }

    pub fn offers(&self) -> &[FlightOffer] {
        &self.offers
    }

    pub fn into_offers(self) -> Vec<FlightOffer> {
        self.offers
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    /// New book with the entry sharing `offer.id` swapped for `offer`.
    pub fn with_replaced(&self, offer: FlightOffer) -> Result<OfferBook, OfferBookError> {
        let position = *self
            .index
            .get(&offer.id)
            .ok_or_else(|| OfferBookError::NotFound(offer.id.clone()))?;

        let mut offers = self.offers.clone();
        offers[position] = offer;
        Ok(OfferBook { offers, index: self.index.clone() })
    }

    /// Apply several replacements at once. Unknown ids are skipped.
    pub fn with_replacements(&self, replacements: Vec<FlightOffer>) -> OfferBook {
        let mut offers = self.offers.clone();
        for offer in replacements {
            match self.index.get(&offer.id) {
                Some(&position) => offers[position] = offer,
                None => tracing::warn!("Ignoring replacement for unknown offer {}", offer.id),
            }
        }
        OfferBook { offers, index: self.index.clone() }
    }
}

impl From<Vec<FlightOffer>> for OfferBook {
    fn from(offers: Vec<FlightOffer>) -> Self {
        Self::new(offers)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OfferBookError {
    #[error("Offer not found: {0}")]
    NotFound(String),
}
