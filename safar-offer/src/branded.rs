use futures_util::future::join_all;
use safar_core::envelope::BrandedFaresRequest;
use safar_core::FlightProvider;
use serde_json::Value;
use std::sync::Arc;

use crate::book::OfferBook;
use crate::models::{BrandFetchError, FareBrand, FlightOffer};
use crate::parse::brand_from_value;

/// Fetches brand data for offers whose brands come from the side channel.
///
/// All fetches of a batch run concurrently. A failed fetch only marks its own
/// offer with `branded_fetch_error` and is never retried.
pub struct BrandedFareAugmenter {
    provider: Arc<dyn FlightProvider>,
}

impl BrandedFareAugmenter {
    pub fn new(provider: Arc<dyn FlightProvider>) -> Self {
        Self { provider }
    }

    /// Returns a new book. Offers that already carry brands or a fetch error
    /// are left alone, so running this twice costs no extra calls.
    pub async fn augment(
        &self,
        book: &OfferBook,
        origin: &str,
        destination: &str,
        token: Option<&str>,
    ) -> OfferBook {
        let pending: Vec<&FlightOffer> = book
            .offers()
            .iter()
            .filter(|o| o.wants_branded_fares() && !o.is_brand_resolved())
            .collect();

        if pending.is_empty() {
            return book.clone();
        }

        let updated = join_all(
            pending
                .into_iter()
                .map(|offer| self.fetch(offer, origin, destination, token)),
        )
        .await;

        let failed = updated.iter().filter(|o| o.branded_fetch_error.is_some()).count();
        tracing::info!(
            "Branded fares fetched for {} offers ({} failed)",
            updated.len(),
            failed
        );

        book.with_replacements(updated)
    }

    async fn fetch(&self, offer: &FlightOffer, origin: &str, destination: &str, token: Option<&str>) -> FlightOffer {
        match self.request_brands(offer, origin, destination, token).await {
            Ok((brands, fare_info)) => FlightOffer {
                brands: Some(brands),
                fare_info: fare_info.or_else(|| offer.fare_info.clone()),
                ..offer.clone()
            },
            Err(message) => {
                tracing::warn!("Branded fare fetch failed for offer {}: {}", offer.id, message);
                FlightOffer {
                    branded_fetch_error: Some(BrandFetchError { message }),
                    ..offer.clone()
                }
            }
        }
    }

    async fn request_brands(
        &self,
        offer: &FlightOffer,
        origin: &str,
        destination: &str,
        token: Option<&str>,
    ) -> Result<(Vec<FareBrand>, Option<Value>), String> {
        let flight_data = serde_json::to_value(offer).map_err(|e| e.to_string())?;
        let request = BrandedFaresRequest {
            flight_data,
            origin: offer.origin().unwrap_or(origin).to_string(),
            destination: offer.destination().unwrap_or(destination).to_string(),
            token: token.map(str::to_string),
        };

        let response = self
            .provider
            .branded_fares(&request)
            .await
            .map_err(|e| e.to_string())?;
        parse_branded_response(&response)
    }
}

fn parse_branded_response(response: &Value) -> Result<(Vec<FareBrand>, Option<Value>), String> {
    let rejected = response.get("success").and_then(Value::as_bool) == Some(false)
        || response.get("error").is_some_and(|e| !e.is_null());
    if rejected {
        let message = ["message", "detail", "error"]
            .iter()
            .filter_map(|key| response.get(*key))
            .find_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                other => other.get("message")?.as_str().map(str::to_string),
            })
            .unwrap_or_else(|| "Branded fare request was rejected".to_string());
        return Err(message);
    }

    let body = response.get("data").filter(|d| d.is_object()).unwrap_or(response);
    let brands = ["brands", "brandedFares"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_array))
        .map(|items| items.iter().filter_map(brand_from_value).collect())
        .unwrap_or_default();
    let fare_info = body.get("fareInfo").filter(|v| !v.is_null()).cloned();

    Ok((brands, fare_info))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{offer, segment};
    use safar_core::provider::{MockFlightProvider, ProviderError};
    use serde_json::json;

    fn branded(id: &str) -> FlightOffer {
        let mut o = offer(id, 100.0, vec![segment("PK", "KHI", "JED", "09:00")]);
        o.capabilities.branded_fare_supported = true;
        o.capabilities.branded_fare_separate = true;
        o
    }

    #[tokio::test]
    async fn test_failure_is_isolated_per_offer() {
        let provider = Arc::new(MockFlightProvider::new().on_branded_fares(|req| {
            if req.flight_data["id"] == "x" {
                return Err(ProviderError::Timeout { operation: "branded_fares" });
            }
            Ok(json!({
                "brands": [
                    { "brandId": "SAVER", "brandName": "Saver", "fare": { "total": 100, "currency": "PKR" } },
                    { "brandId": "FLEX", "brandName": "Flex", "fare": { "total": 130, "currency": "PKR" } }
                ],
                "fareInfo": { "rules": "non-refundable" }
            }))
        }));
        let augmenter = BrandedFareAugmenter::new(provider.clone());
        let book = OfferBook::new(vec![branded("x"), branded("y"), offer("plain", 80.0, vec![])]);

        let result = augmenter.augment(&book, "KHI", "JED", None).await;

        let x = result.get("x").unwrap();
        assert!(x.branded_fetch_error.is_some());
        assert!(x.brands.is_none());
        assert_eq!(x.fare.total, 100.0);

        let y = result.get("y").unwrap();
        assert_eq!(y.brand_count(), 2);
        assert_eq!(y.fare_info.as_ref().unwrap()["rules"], "non-refundable");

        assert!(result.get("plain").unwrap().brands.is_none());
        assert_eq!(provider.calls().branded.len(), 2);
    }

    /// Answers branded-fare calls only once `gate` has seen every caller.
    struct GatedProvider {
        gate: tokio::sync::Barrier,
    }

    #[async_trait::async_trait]
    impl FlightProvider for GatedProvider {
        async fn search(&self, _: &safar_core::ProviderRequestEnvelope) -> safar_core::ProviderResult<Value> {
            Ok(json!([]))
        }

        async fn validate(&self, _: &safar_core::envelope::ValidateRequest) -> safar_core::ProviderResult<Value> {
            Ok(json!({}))
        }

        async fn book(&self, _: &safar_core::envelope::BookRequest) -> safar_core::ProviderResult<Value> {
            Ok(json!({}))
        }

        async fn branded_fares(&self, _: &BrandedFaresRequest) -> safar_core::ProviderResult<Value> {
            self.gate.wait().await;
            Ok(json!({
                "brands": [{ "brandId": "FLEX", "brandName": "Flex", "fare": { "total": 130, "currency": "PKR" } }]
            }))
        }
    }

    #[tokio::test]
    async fn test_fetches_in_a_batch_overlap() {
        let provider = Arc::new(GatedProvider { gate: tokio::sync::Barrier::new(2) });
        let augmenter = BrandedFareAugmenter::new(provider);
        let book = OfferBook::new(vec![branded("x"), branded("y")]);

        // Sequential fetches would park on the barrier forever.
        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            augmenter.augment(&book, "KHI", "JED", None),
        )
        .await
        .expect("branded fetches ran one at a time");

        assert_eq!(result.get("x").unwrap().brand_count(), 1);
        assert_eq!(result.get("y").unwrap().brand_count(), 1);
    }

    #[tokio::test]
    async fn test_second_pass_makes_no_calls() {
        let provider = Arc::new(
            MockFlightProvider::new()
                .on_branded_fares(|_| Ok(json!({ "success": false, "message": "Brands unavailable" }))),
        );
        let augmenter = BrandedFareAugmenter::new(provider.clone());
        let book = OfferBook::new(vec![branded("x")]);

        let first = augmenter.augment(&book, "KHI", "JED", None).await;
        assert_eq!(
            first.get("x").unwrap().branded_fetch_error.as_ref().unwrap().message,
            "Brands unavailable"
        );

        let second = augmenter.augment(&first, "KHI", "JED", None).await;
        assert_eq!(provider.calls().branded.len(), 1);
        assert_eq!(second.get("x"), first.get("x"));
    }
}
