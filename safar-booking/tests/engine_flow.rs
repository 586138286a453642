use chrono::NaiveDate;
use safar_booking::saga::SagaStage;
use safar_booking::{BookingError, BookingSettings, FlightEngine};
use safar_core::criteria::{LegCriteria, PassengerCounts, SearchCriteria, TripType};
use safar_core::passenger::{ContactDetails, PassengerRecord, PaxType, Salutation, TravelDocument};
use safar_core::envelope::{BookRequest, BrandedFaresRequest, ValidateRequest};
use safar_core::provider::{MockFlightProvider, ProviderError};
use safar_core::{AuthContext, FlightProvider, ProviderRequestEnvelope, ProviderResult};
use safar_offer::{apply_filters, OfferFilters};
use safar_shared::Masked;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn raw_offer(id: &str, from: &str, to: &str, day: &str, total: u32) -> Value {
    json!({
        "id": id,
        "supplierCode": "11",
        "fare": { "baseFare": total - total / 5, "tax": total / 5, "total": total, "currency": "PKR" },
        "duration": "3h 35m",
        "segments": [{
            "marketingAirline": "PK",
            "flightNumber": "741",
            "origin": from,
            "destination": to,
            "departureDate": day,
            "departureTime": "09:30",
            "arrivalDate": day,
            "arrivalTime": "13:05"
        }],
        "supplierSpecific": { "fareKey": format!("fk-{id}") }
    })
}

fn lead_passenger() -> PassengerRecord {
    PassengerRecord {
        pax_type: PaxType::Adt,
        salutation: Salutation::Mrs,
        first_name: "Sana".into(),
        last_name: "Malik".into(),
        birth_date: "1990-04-12".into(),
        nationality: "PK".into(),
        document: TravelDocument {
            number: Masked::from("AB1234567"),
            issuing_country: "PK".into(),
            expiry: "2030-01-31".into(),
        },
        contact: Some(ContactDetails {
            email: Masked::from("sana@example.com"),
            phone: Masked::from("+923001234567"),
        }),
    }
}

fn engine(provider: Arc<MockFlightProvider>) -> FlightEngine {
    FlightEngine::new(provider, Arc::new(AuthContext::with_token("bearer-1")), BookingSettings::default())
}

#[tokio::test]
async fn test_one_way_search_and_book() {
    let provider = Arc::new(
        MockFlightProvider::new()
            .on_search(|_| Ok(json!({ "flights": [raw_offer("PK741", "KHI", "JED", "2026-02-06", 150000)] }))),
    );
    let engine = engine(provider.clone());

    let criteria = SearchCriteria::one_way("KHI", "JED", date("2026-02-06"))
        .with_passengers(PassengerCounts::new(1, 0, 0));
    let outcome = engine.search(&criteria).await.unwrap();
    assert!(outcome.per_leg.is_none());

    let shown = apply_filters(outcome.offers.offers(), &OfferFilters::default());
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].fare.total, 150000.0);
    assert_eq!(shown[0].fare.currency, "PKR");

    let confirmation = engine
        .book(&shown[0], None, TripType::OneWay, &[lead_passenger()])
        .await
        .unwrap();
    assert!(!confirmation.pnr.is_empty());
    assert_eq!(confirmation.booking_ref_id.as_deref(), Some("BR-MOCK-01"));

    let calls = provider.calls();
    assert_eq!(calls.searches.len(), 1);
    assert_eq!(calls.searches[0].trip_type, "O");
    assert_eq!(calls.searches[0].token.as_deref(), Some("bearer-1"));
    assert_eq!(calls.validations.len(), 1);
    assert_eq!(calls.bookings.len(), 1);
    assert_eq!(calls.bookings[0].sealed, "mock-sealed-token");
}

#[tokio::test]
async fn test_empty_multi_city_falls_back_to_per_leg_searches() {
    let provider = Arc::new(MockFlightProvider::new().on_search(|request| {
        if request.trip_type == "M" {
            return Ok(json!({ "flights": [] }));
        }
        let od = &request.origin_destinations[0];
        let id = format!("{}-{}", od.origin, od.destination);
        Ok(json!({
            "results": [raw_offer(&id, &od.origin, &od.destination, &od.departure_date.to_string(), 90000)]
        }))
    }));
    let engine = engine(provider.clone());

    let criteria = SearchCriteria::multi_city(vec![
        LegCriteria::new("KHI", "DXB", date("2026-03-01")),
        LegCriteria::new("DXB", "LHE", date("2026-03-08")),
    ]);
    let outcome = engine.search(&criteria).await.unwrap();
    assert!(outcome.offers.is_empty());

    let mut per_leg = outcome.per_leg.expect("fallback option set");
    assert_eq!(per_leg.len(), 2);

    let searches = provider.calls().searches;
    assert_eq!(searches.iter().filter(|s| s.trip_type == "M").count(), 1);
    assert_eq!(searches.iter().filter(|s| s.trip_type == "O").count(), 2);

    // Combined validate is refused until every leg has a pick.
    per_leg.select(0, "KHI-DXB", None).unwrap();
    let failure = engine.book_combined(&per_leg, &[lead_passenger()]).await.unwrap_err();
    assert_eq!(failure.stage, SagaStage::Build);
    assert!(matches!(failure.error, BookingError::IncompleteSelection { ref missing } if missing == &vec![2]));
    assert!(provider.calls().validations.is_empty());

    per_leg.select(1, "DXB-LHE", None).unwrap();
    let confirmation = engine.book_combined(&per_leg, &[lead_passenger()]).await.unwrap();
    assert_eq!(confirmation.pnr, "MOCK01");

    let calls = provider.calls();
    let flight_data = &calls.validations[0].flight_data;
    assert_eq!(flight_data["tripType"], "M");
    assert_eq!(flight_data["fare"]["total"], 180000.0);
    assert_eq!(flight_data["supplierCodes"], json!(["11", "11"]));
    assert_eq!(flight_data["supplierSpecific"].as_array().map(Vec::len), Some(2));
    assert_eq!(flight_data["odPairs"][1]["origin"], "DXB");
}

fn leg_with_brands(id: &str, from: &str, to: &str, day: &str) -> Value {
    let mut offer = raw_offer(id, from, to, day, 100);
    offer["brands"] = json!([
        {
            "brandId": "LITE",
            "brandName": "Lite",
            "fare": { "baseFare": 60, "tax": 20, "total": 80, "currency": "PKR" },
            "supplierSpecific": { "brandKey": format!("{id}-lite") }
        },
        {
            "brandId": "FLEX",
            "brandName": "Flex",
            "fare": { "baseFare": 110, "tax": 20, "total": 130, "currency": "PKR" },
            "supplierSpecific": { "brandKey": format!("{id}-flex") }
        }
    ]);
    offer
}

#[tokio::test]
async fn test_combined_booking_requires_a_brand_on_every_branded_leg() {
    let provider = Arc::new(MockFlightProvider::new().on_search(|request| {
        if request.trip_type == "M" {
            return Ok(json!({ "flights": [] }));
        }
        let od = &request.origin_destinations[0];
        let id = format!("{}-{}", od.origin, od.destination);
        Ok(json!([leg_with_brands(&id, &od.origin, &od.destination, &od.departure_date.to_string())]))
    }));
    let engine = engine(provider.clone());

    let criteria = SearchCriteria::multi_city(vec![
        LegCriteria::new("KHI", "DXB", date("2026-03-01")),
        LegCriteria::new("DXB", "LHE", date("2026-03-08")),
    ]);
    let mut per_leg = engine.search(&criteria).await.unwrap().per_leg.unwrap();

    per_leg.select(0, "KHI-DXB", None).unwrap();
    per_leg.select(1, "DXB-LHE", None).unwrap();
    let failure = engine.book_combined(&per_leg, &[lead_passenger()]).await.unwrap_err();
    assert_eq!(failure.stage, SagaStage::Build);
    assert!(matches!(
        failure.error,
        BookingError::LegBrandSelectionRequired { leg: 1, count: 2, .. }
    ));
    assert!(provider.calls().validations.is_empty());

    per_leg.select(0, "KHI-DXB", Some("FLEX")).unwrap();
    let failure = engine.book_combined(&per_leg, &[lead_passenger()]).await.unwrap_err();
    assert!(matches!(failure.error, BookingError::LegBrandSelectionRequired { leg: 2, .. }));

    per_leg.select(1, "DXB-LHE", Some("LITE")).unwrap();
    engine.book_combined(&per_leg, &[lead_passenger()]).await.unwrap();

    let calls = provider.calls();
    let flight_data = &calls.validations[0].flight_data;
    assert_eq!(flight_data["fare"]["total"], 210.0);
    assert_eq!(flight_data["brandId"], "FLEX");
    assert_eq!(flight_data["legBrandIds"], json!(["FLEX", "LITE"]));
    assert_eq!(
        flight_data["supplierSpecific"],
        json!([{ "brandKey": "KHI-DXB-flex" }, { "brandKey": "DXB-LHE-lite" }])
    );
}

/// Per-leg searches only answer once both legs are in flight.
struct GatedLegProvider {
    gate: Barrier,
}

#[async_trait::async_trait]
impl FlightProvider for GatedLegProvider {
    async fn search(&self, request: &ProviderRequestEnvelope) -> ProviderResult<Value> {
        if request.trip_type == "M" {
            return Ok(json!({ "flights": [] }));
        }
        self.gate.wait().await;
        let od = &request.origin_destinations[0];
        Ok(json!([raw_offer("leg", &od.origin, &od.destination, &od.departure_date.to_string(), 50000)]))
    }

    async fn validate(&self, _: &ValidateRequest) -> ProviderResult<Value> {
        Ok(json!({}))
    }

    async fn book(&self, _: &BookRequest) -> ProviderResult<Value> {
        Ok(json!({}))
    }

    async fn branded_fares(&self, _: &BrandedFaresRequest) -> ProviderResult<Value> {
        Ok(json!({}))
    }
}

#[tokio::test]
async fn test_per_leg_searches_run_concurrently() {
    let provider = Arc::new(GatedLegProvider { gate: Barrier::new(2) });
    let engine = FlightEngine::new(provider, Arc::new(AuthContext::with_token("bearer-1")), BookingSettings::default());

    let criteria = SearchCriteria::multi_city(vec![
        LegCriteria::new("KHI", "DXB", date("2026-03-01")),
        LegCriteria::new("DXB", "LHE", date("2026-03-08")),
    ]);
    let outcome = tokio::time::timeout(Duration::from_secs(5), engine.search(&criteria))
        .await
        .expect("leg searches ran one at a time")
        .unwrap();

    let per_leg = outcome.per_leg.unwrap();
    assert_eq!(per_leg.legs[0].options.len(), 1);
    assert_eq!(per_leg.legs[1].options.len(), 1);
}

#[tokio::test]
async fn test_failed_leg_search_is_isolated() {
    let provider = Arc::new(MockFlightProvider::new().on_search(|request| {
        let od = &request.origin_destinations[0];
        match request.trip_type.as_str() {
            "M" => Ok(json!({ "flights": [] })),
            _ if od.origin == "DXB" => Err(ProviderError::Timeout { operation: "search" }),
            _ => Ok(json!([raw_offer("leg1", &od.origin, &od.destination, "2026-03-01", 50000)])),
        }
    }));
    let engine = engine(provider);

    let criteria = SearchCriteria::multi_city(vec![
        LegCriteria::new("KHI", "DXB", date("2026-03-01")),
        LegCriteria::new("DXB", "LHE", date("2026-03-08")),
    ]);
    let per_leg = engine.search(&criteria).await.unwrap().per_leg.unwrap();

    assert_eq!(per_leg.legs[0].options.len(), 1);
    assert!(per_leg.legs[0].error.is_none());
    assert!(per_leg.legs[1].options.is_empty());
    assert!(per_leg.legs[1].error.is_some());
}

#[tokio::test]
async fn test_branded_fetch_failure_is_isolated_per_offer() {
    let provider = Arc::new(
        MockFlightProvider::new()
            .on_search(|_| {
                let mut x = raw_offer("X", "KHI", "JED", "2026-02-06", 150000);
                let mut y = raw_offer("Y", "KHI", "JED", "2026-02-06", 160000);
                for offer in [&mut x, &mut y] {
                    offer["brandedFareSupported"] = json!(true);
                    offer["brandedFareSeparate"] = json!(true);
                }
                Ok(json!({ "flights": [x, y] }))
            })
            .on_branded_fares(|request| {
                if request.flight_data["id"] == "X" {
                    return Err(ProviderError::Status {
                        operation: "branded_fares",
                        status: 500,
                        message: "Brand service unavailable".into(),
                        body: None,
                    });
                }
                Ok(json!({
                    "brands": [
                        { "brandId": "LITE", "brandName": "Lite", "fare": { "baseFare": 130000, "tax": 30000, "total": 160000 } },
                        { "brandId": "FLEX", "brandName": "Flex", "fare": { "baseFare": 150000, "tax": 30000, "total": 180000 } }
                    ]
                }))
            }),
    );
    let engine = engine(provider.clone());

    let outcome = engine
        .search(&SearchCriteria::one_way("KHI", "JED", date("2026-02-06")))
        .await
        .unwrap();
    assert_eq!(provider.calls().branded.len(), 2);

    let x = outcome.offers.get("X").unwrap();
    assert!(x.branded_fetch_error.is_some());
    assert!(x.brands.is_none());
    assert_eq!(x.fare.total, 150000.0);

    let y = outcome.offers.get("Y").unwrap();
    assert!(y.branded_fetch_error.is_none());
    assert_eq!(y.brand_count(), 2);

    // Two brands: booking without a pick never reaches validate.
    let failure = engine
        .book(y, None, TripType::OneWay, &[lead_passenger()])
        .await
        .unwrap_err();
    assert!(matches!(failure.error, BookingError::BrandSelectionRequired { count: 2, .. }));
    assert!(provider.calls().validations.is_empty());

    let flex = engine.select_brand(y, "FLEX").unwrap();
    assert_eq!(flex.fare.total, 180000.0);
    engine
        .book(&flex, None, TripType::OneWay, &[lead_passenger()])
        .await
        .unwrap();
    assert_eq!(provider.calls().validations[0].flight_data["brandId"], "FLEX");
}

#[tokio::test]
async fn test_single_brand_is_applied_without_selection() {
    let provider = Arc::new(MockFlightProvider::new().on_search(|_| {
        let mut offer = raw_offer("S1", "KHI", "JED", "2026-02-06", 150000);
        offer["brands"] = json!([{
            "brandId": "VALUE",
            "brandName": "Value",
            "fare": { "baseFare": 140000, "tax": 30000, "total": 170000, "currency": "PKR" },
            "supplierSpecific": { "brandKey": "value-1" }
        }]);
        Ok(json!({ "flights": [offer] }))
    }));
    let engine = engine(provider.clone());

    let outcome = engine
        .search(&SearchCriteria::one_way("KHI", "JED", date("2026-02-06")))
        .await
        .unwrap();
    let offer = outcome.offers.get("S1").unwrap();
    engine
        .book(offer, None, TripType::OneWay, &[lead_passenger()])
        .await
        .unwrap();

    let flight_data = &provider.calls().validations[0].flight_data;
    assert_eq!(flight_data["brandId"], "VALUE");
    assert_eq!(flight_data["fare"]["total"], 170000.0);
    assert_eq!(flight_data["supplierSpecific"]["brandKey"], "value-1");
}

#[tokio::test]
async fn test_validate_without_sealed_token_stops_the_saga() {
    let provider = Arc::new(
        MockFlightProvider::new()
            .on_search(|_| Ok(json!({ "flights": [raw_offer("PK741", "KHI", "JED", "2026-02-06", 150000)] })))
            .on_validate(|_| Ok(json!({ "success": true }))),
    );
    let engine = engine(provider.clone());

    let outcome = engine
        .search(&SearchCriteria::one_way("KHI", "JED", date("2026-02-06")))
        .await
        .unwrap();
    let failure = engine
        .book(&outcome.offers.offers()[0], None, TripType::OneWay, &[lead_passenger()])
        .await
        .unwrap_err();

    assert_eq!(failure.stage, SagaStage::Validate);
    assert_eq!(failure.error.to_string(), "Failed to get sealed token from validation.");
    assert!(provider.calls().bookings.is_empty());
}
