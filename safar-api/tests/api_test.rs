use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use safar_api::{app, AppState};
use safar_booking::{BookingSettings, FlightEngine};
use safar_core::provider::MockFlightProvider;
use safar_core::AuthContext;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn test_app(provider: MockFlightProvider) -> (Router, Arc<MockFlightProvider>) {
    let provider = Arc::new(provider);
    let engine = FlightEngine::new(
        provider.clone(),
        Arc::new(AuthContext::with_token("test-token")),
        BookingSettings::default(),
    );
    (app(AppState::new(engine)), provider)
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn raw_offer(id: &str, airline: &str, time: &str, total: u32) -> Value {
    json!({
        "id": id,
        "fare": { "baseFare": total - 1000, "tax": 1000, "total": total, "currency": "PKR" },
        "segments": [{
            "marketingAirline": airline,
            "flightNumber": "101",
            "origin": "KHI",
            "destination": "JED",
            "departureDate": "2026-02-06",
            "departureTime": time
        }]
    })
}

fn passenger() -> Value {
    json!({
        "paxType": "ADT",
        "salutation": "Mr",
        "firstName": "Usman",
        "lastName": "Tariq",
        "birthDate": "1988-09-14",
        "nationality": "PK",
        "document": { "number": "ZX9988776", "issuingCountry": "PK", "expiry": "2031-06-30" },
        "contact": { "email": "usman@example.com", "phone": "+923211234567" }
    })
}

#[tokio::test]
async fn test_health() {
    let (app, _) = test_app(MockFlightProvider::new());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_search_applies_filters_and_reports_facets() {
    let (app, provider) = test_app(MockFlightProvider::new().on_search(|_| {
        Ok(json!({
            "data": {
                "flights": [
                    raw_offer("a", "PK", "09:00", 150000),
                    raw_offer("b", "EK", "14:00", 120000),
                    raw_offer("c", "PK", "22:00", 110000)
                ]
            }
        }))
    }));

    let (status, body) = post_json(
        app,
        "/v1/flights/search",
        json!({
            "criteria": {
                "tripType": "OneWay",
                "origin": "KHI",
                "destination": "JED",
                "departureDate": "2026-02-06",
                "passengers": { "adults": 1 }
            },
            "filters": { "airlines": ["PK"], "sort": "price" }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    let ids: Vec<&str> = body["offers"].as_array().unwrap().iter().map(|o| o["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["c", "a"]);
    assert_eq!(body["airlines"], json!(["EK", "PK"]));
    assert_eq!(body["priceRange"]["min"], 110000.0);
    assert!(body.get("perLeg").is_none());

    let searches = provider.calls().searches;
    assert_eq!(searches[0].token.as_deref(), Some("test-token"));
}

#[tokio::test]
async fn test_invalid_criteria_is_bad_request() {
    let (app, provider) = test_app(MockFlightProvider::new());
    let (status, body) = post_json(
        app,
        "/v1/flights/search",
        json!({
            "criteria": {
                "tripType": "OneWay",
                "origin": "KH",
                "destination": "JED",
                "departureDate": "2026-02-06"
            }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());
    assert!(provider.calls().searches.is_empty());
}

#[tokio::test]
async fn test_book_returns_confirmation() {
    let (app, provider) = test_app(MockFlightProvider::new().on_search(|_| Ok(json!([raw_offer("a", "PK", "09:00", 150000)]))));

    let (_, search) = post_json(
        app.clone(),
        "/v1/flights/search",
        json!({
            "criteria": { "tripType": "OneWay", "origin": "KHI", "destination": "JED", "departureDate": "2026-02-06" }
        }),
    )
    .await;
    let offer = search["offers"][0].clone();

    let (status, body) = post_json(
        app,
        "/v1/flights/book",
        json!({ "offer": offer, "tripType": "OneWay", "passengers": [passenger()] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pnr"], "MOCK01");
    assert_eq!(provider.calls().bookings[0].passengers[0].date_of_birth, "14-09-1988");
}

#[tokio::test]
async fn test_rejected_booking_surfaces_provider_detail() {
    let (app, _) = test_app(
        MockFlightProvider::new().on_book(|_| Ok(json!({ "success": false, "message": "Fare class closed" }))),
    );
    let offer = json!({
        "id": "a",
        "legs": [{ "segments": [{
            "marketingAirline": "PK",
            "flightNumber": "101",
            "departure": { "airport": "KHI" },
            "arrival": { "airport": "JED" }
        }] }],
        "fare": { "baseFare": 100.0, "tax": 10.0, "total": 110.0, "currency": "PKR" },
        "supplierCode": "11"
    });

    let (status, body) = post_json(
        app,
        "/v1/flights/book",
        json!({ "offer": offer, "tripType": "OneWay", "passengers": [passenger()] }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["stage"], "book");
    assert_eq!(body["error"], "Booking failed: Fare class closed");
    assert_eq!(body["detail"]["success"], false);
}

#[tokio::test]
async fn test_multi_city_book_requires_every_leg() {
    let (app, provider) = test_app(MockFlightProvider::new());
    let leg_offer = |id: &str, from: &str, to: &str| {
        json!({
            "id": id,
            "legs": [{ "segments": [{
                "marketingAirline": "PK",
                "flightNumber": "301",
                "departure": { "airport": from },
                "arrival": { "airport": to }
            }] }],
            "fare": { "baseFare": 80.0, "tax": 20.0, "total": 100.0, "currency": "PKR" },
            "supplierCode": "11",
            "supplierSpecific": { "key": id }
        })
    };
    let per_leg = json!({
        "legs": [
            { "leg": { "origin": "KHI", "destination": "DXB", "date": "2026-03-01" }, "options": [leg_offer("l1", "KHI", "DXB")] },
            { "leg": { "origin": "DXB", "destination": "LHE", "date": "2026-03-08" }, "options": [leg_offer("l2", "DXB", "LHE")] }
        ]
    });

    let (status, body) = post_json(
        app.clone(),
        "/v1/flights/multi-city/book",
        json!({ "perLeg": per_leg, "selections": ["l1", null], "passengers": [passenger()] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please select a flight for leg(s) 2 before continuing.");
    assert!(provider.calls().validations.is_empty());

    let (status, body) = post_json(
        app,
        "/v1/flights/multi-city/book",
        json!({ "perLeg": per_leg, "selections": ["l1", "l2"], "passengers": [passenger()] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pnr"], "MOCK01");
    assert_eq!(provider.calls().validations[0].flight_data["fare"]["total"], 200.0);
}

#[tokio::test]
async fn test_select_brand_unknown_brand() {
    let (app, _) = test_app(MockFlightProvider::new());
    let offer = json!({
        "id": "a",
        "legs": [],
        "fare": { "baseFare": 100.0, "tax": 10.0, "total": 110.0, "currency": "PKR" },
        "supplierCode": "11",
        "brands": [{ "brandId": "LITE", "brandName": "Lite", "fare": { "baseFare": 90.0, "tax": 10.0, "total": 100.0 } }]
    });

    let (status, _) = post_json(app.clone(), "/v1/flights/select-brand", json!({ "offer": offer, "brandId": "GOLD" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_json(app, "/v1/flights/select-brand", json!({ "offer": offer, "brandId": "LITE" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selectedBrandId"], "LITE");
    assert_eq!(body["fare"]["total"], 100.0);
}

#[tokio::test]
async fn test_multi_city_book_requires_brand_per_leg() {
    let (app, provider) = test_app(MockFlightProvider::new());
    let leg_offer = |id: &str, from: &str, to: &str| {
        json!({
            "id": id,
            "legs": [{ "segments": [{
                "marketingAirline": "PK",
                "flightNumber": "301",
                "departure": { "airport": from },
                "arrival": { "airport": to }
            }] }],
            "fare": { "baseFare": 80.0, "tax": 20.0, "total": 100.0, "currency": "PKR" },
            "supplierCode": "11",
            "supplierSpecific": { "native": id },
            "brands": [
                { "brandId": "LITE", "brandName": "Lite", "fare": { "baseFare": 70.0, "tax": 20.0, "total": 90.0 }, "supplierSpecific": { "brand": format!("{id}-lite") } },
                { "brandId": "FLEX", "brandName": "Flex", "fare": { "baseFare": 120.0, "tax": 20.0, "total": 140.0 }, "supplierSpecific": { "brand": format!("{id}-flex") } }
            ]
        })
    };
    let per_leg = json!({
        "legs": [
            { "leg": { "origin": "KHI", "destination": "DXB", "date": "2026-03-01" }, "options": [leg_offer("l1", "KHI", "DXB")] },
            { "leg": { "origin": "DXB", "destination": "LHE", "date": "2026-03-08" }, "options": [leg_offer("l2", "DXB", "LHE")] }
        ]
    });

    let (status, body) = post_json(
        app.clone(),
        "/v1/flights/multi-city/book",
        json!({ "perLeg": per_leg, "selections": ["l1", "l2"], "passengers": [passenger()] }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Leg 1: offer l1 has 2 fare brands. Choose one before booking.");
    assert!(provider.calls().validations.is_empty());

    let (status, _) = post_json(
        app,
        "/v1/flights/multi-city/book",
        json!({
            "perLeg": per_leg,
            "selections": ["l1", "l2"],
            "brandIds": ["FLEX", "LITE"],
            "passengers": [passenger()]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let flight_data = &provider.calls().validations[0].flight_data;
    assert_eq!(flight_data["fare"]["total"], 230.0);
    assert_eq!(flight_data["brandId"], "FLEX");
    assert_eq!(flight_data["legBrandIds"], json!(["FLEX", "LITE"]));
    assert_eq!(flight_data["supplierSpecific"], json!([{ "brand": "l1-flex" }, { "brand": "l2-lite" }]));
}
