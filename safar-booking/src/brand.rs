use safar_offer::FlightOffer;

use crate::BookingError;

/// Overlay an explicitly chosen brand onto an offer.
pub fn select_brand(offer: &FlightOffer, brand_id: &str) -> Result<FlightOffer, BookingError> {
    offer
        .find_brand(brand_id)
        .map(|brand| offer.with_brand(brand))
        .ok_or_else(|| BookingError::UnknownBrand {
            offer_id: offer.id.clone(),
            brand_id: brand_id.to_string(),
        })
}

/// Brand gate run before any validate call. Returns the offer to validate and
/// the brand id to send with it.
///
/// * more than one brand: `chosen` is required
/// * exactly one brand: applied without asking
/// * no brands: native fare, `default_brand_id`
pub fn resolve_brand(
    offer: &FlightOffer,
    chosen: Option<&str>,
    default_brand_id: &str,
) -> Result<(FlightOffer, String), BookingError> {
    if let Some(selected) = &offer.selected_brand_id {
        if chosen.is_none() || chosen == Some(selected.as_str()) {
            return Ok((offer.clone(), selected.clone()));
        }
    }

    let brands = offer.brands.as_deref().unwrap_or_default();
    match (brands, chosen) {
        ([], _) => Ok((offer.clone(), default_brand_id.to_string())),
        ([only], None) => Ok((offer.with_brand(only), only.brand_id.clone())),
        (_, Some(brand_id)) => {
            let branded = select_brand(offer, brand_id)?;
            Ok((branded, brand_id.to_string()))
        }
        (many, None) => Err(BookingError::BrandSelectionRequired {
            offer_id: offer.id.clone(),
            count: many.len(),
        }),
    }
}
