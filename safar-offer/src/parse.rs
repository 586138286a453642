//! Lenient mapping of raw provider offers into the canonical model.
//!
//! Field names differ between suppliers, so every field is looked up through
//! a short list of aliases. Missing values fall back to defaults.

use serde_json::Value;

use crate::models::{
    BaggageAllowance, BrandBenefits, Fare, FareBrand, FlightOffer, FlightPoint, FlightSegment,
    ItineraryLeg, OfferCapabilities,
};

const LEG_GROUP_KEYS: [&str; 5] = ["ondPairs", "legs", "itineraries", "journeys", "bounds"];
const SEGMENT_KEYS: [&str; 3] = ["segments", "flights", "flightSegments"];
const DURATION_KEYS: [&str; 4] = ["duration", "totalDuration", "journeyDuration", "elapsedTime"];

pub fn offer_from_value(raw: &Value, index: usize, default_supplier_code: &str) -> Option<FlightOffer> {
    raw.as_object()?;

    let brands = first(raw, &["brands", "brandedFares", "fareBrands"])
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(brand_from_value).collect());

    Some(FlightOffer {
        id: text(raw, &["id", "offerId", "offer_id", "resultId", "flightId", "key"])
            .unwrap_or_else(|| format!("offer-{}", index + 1)),
        legs: parse_legs(raw),
        fare: parse_fare(raw),
        supplier_code: text(raw, &["supplierCode", "supplier_code", "supplier"])
            .unwrap_or_else(|| default_supplier_code.to_string()),
        supplier_specific: first(raw, &["supplierSpecific", "supplier_specific"])
            .cloned()
            .unwrap_or(Value::Null),
        brands,
        fare_info: first(raw, &["fareInfo", "fare_info"]).cloned(),
        capabilities: OfferCapabilities {
            branded_fare_supported: flag(raw, &["brandedFareSupported", "isBrandedFareSupported"]),
            branded_fare_separate: flag(raw, &["brandedFareSeparate", "isBrandedFareSeparate"]),
            fare_rule_offered: flag(raw, &["fareRuleOffered", "isFareRuleOffered"]),
            refundable: flag(raw, &["refundable", "isRefundable"]),
            instant_ticketing: flag(raw, &["instantTicketing", "isInstantTicketing"]),
        },
        branded_fetch_error: None,
        selected_brand_id: None,
    })
}

pub fn brand_from_value(raw: &Value) -> Option<FareBrand> {
    raw.as_object()?;
    let brand_id = text(raw, &["brandId", "brand_id", "id", "code"])?;
    Some(FareBrand {
        brand_name: text(raw, &["brandName", "brand_name", "name"]).unwrap_or_else(|| brand_id.clone()),
        brand_id,
        fare: parse_fare(raw),
        supplier_specific: first(raw, &["supplierSpecific", "supplier_specific"])
            .cloned()
            .unwrap_or(Value::Null),
        benefits: BrandBenefits {
            baggage: display(raw, &["baggage", "checkedBaggage"]),
            cabin_baggage: display(raw, &["cabinBaggage", "handBaggage"]),
            cancellable: display(raw, &["cancellable", "refundable"]),
            date_changeable: display(raw, &["dateChangeable", "changeable"]),
            seat_selection: display(raw, &["seatSelection", "seat"]),
            meals: display(raw, &["meals", "meal"]),
            priority: display(raw, &["priority", "priorityBoarding"]),
            lounge: display(raw, &["lounge", "loungeAccess"]),
        },
    })
}

pub fn parse_fare(raw: &Value) -> Fare {
    let source = first(raw, &["fare", "fareDetails", "price", "pricing"])
        .filter(|v| v.is_object())
        .unwrap_or(raw);

    let base = number(source, &["baseFare", "base_fare", "base", "basePrice"]);
    let tax = number(source, &["tax", "taxes", "totalTax", "tax_amount"]).unwrap_or(0.0);
    let total = number(source, &["total", "totalFare", "total_fare", "totalPrice", "amount"]);

    let (base_fare, total) = match (base, total) {
        (Some(b), Some(t)) => (b, t),
        (Some(b), None) => (b, b + tax),
        (None, Some(t)) => (t - tax, t),
        (None, None) => (0.0, 0.0),
    };

    Fare {
        base_fare,
        tax,
        total,
        currency: text(source, &["currency", "currencyCode"])
            .or_else(|| text(raw, &["currency", "currencyCode"]))
            .unwrap_or_default(),
    }
}

fn parse_legs(raw: &Value) -> Vec<ItineraryLeg> {
    for key in LEG_GROUP_KEYS {
        if let Some(groups) = raw.get(key).and_then(Value::as_array) {
            let legs: Vec<ItineraryLeg> = groups.iter().map(parse_leg).collect();
            if legs.iter().any(|leg| !leg.segments.is_empty()) {
                return legs;
            }
        }
    }

    if let Some(segments) = first(raw, &SEGMENT_KEYS).and_then(Value::as_array) {
        return vec![ItineraryLeg {
            segments: segments.iter().map(parse_segment).collect(),
            duration_minutes: first(raw, &DURATION_KEYS).and_then(parse_duration),
        }];
    }
    Vec::new()
}

fn parse_leg(group: &Value) -> ItineraryLeg {
    let segments = match first(group, &SEGMENT_KEYS).and_then(Value::as_array) {
        Some(items) => items.iter().map(parse_segment).collect(),
        // Some suppliers flatten single-segment legs into the leg itself.
        None if group.is_object() => vec![parse_segment(group)],
        None => Vec::new(),
    };
    ItineraryLeg {
        segments,
        duration_minutes: first(group, &DURATION_KEYS).and_then(parse_duration),
    }
}

fn parse_segment(raw: &Value) -> FlightSegment {
    FlightSegment {
        marketing_airline: code(
            raw,
            &["marketingAirline", "marketing_airline", "marketingCarrier", "airlineCode", "carrier", "airline"],
        )
        .unwrap_or_default(),
        operating_airline: code(raw, &["operatingAirline", "operating_airline", "operatingCarrier"]),
        flight_number: text(raw, &["flightNumber", "flight_number", "flightNo", "number"]).unwrap_or_default(),
        departure: parse_point(
            raw,
            "departure",
            &["origin", "from", "departureAirport", "boardAirport"],
            &["departureDate", "depDate"],
            &["departureTime", "depTime"],
            &["departureDateTime", "departure_at"],
        ),
        arrival: parse_point(
            raw,
            "arrival",
            &["destination", "to", "arrivalAirport", "offAirport"],
            &["arrivalDate", "arrDate"],
            &["arrivalTime", "arrTime"],
            &["arrivalDateTime", "arrival_at"],
        ),
        cabin: text(raw, &["cabin", "cabinClass"]),
        fare_basis: text(raw, &["fareBasis", "fare_basis", "fareBasisCode"]),
        rbd: text(raw, &["rbd", "bookingClass", "classOfService"]),
        stops: number(raw, &["stops", "stopCount", "numberOfStops"]).map_or(0, |n| n.max(0.0) as u32),
        baggage: first(raw, &["baggage", "baggageAllowance", "checkedBaggage"])
            .map(parse_baggage)
            .unwrap_or_default(),
    }
}

fn parse_point(
    raw: &Value,
    nested_key: &str,
    airport_keys: &[&str],
    date_keys: &[&str],
    time_keys: &[&str],
    datetime_keys: &[&str],
) -> FlightPoint {
    if let Some(nested) = raw.get(nested_key).filter(|v| v.is_object()) {
        let (dt_date, dt_time) = text(nested, &["at", "dateTime", "datetime"])
            .map(|s| split_datetime(&s))
            .unwrap_or_default();
        return FlightPoint {
            airport: code(nested, &["airport", "airportCode", "code", "iataCode"]).unwrap_or_default(),
            date: text(nested, &["date"]).or(dt_date),
            time: text(nested, &["time"]).map(|t| trim_time(&t)).or(dt_time),
        };
    }

    let (dt_date, dt_time) = text(raw, datetime_keys)
        .map(|s| split_datetime(&s))
        .unwrap_or_default();
    FlightPoint {
        airport: code(raw, airport_keys).unwrap_or_default(),
        date: text(raw, date_keys).or(dt_date),
        time: text(raw, time_keys).map(|t| trim_time(&t)).or(dt_time),
    }
}

fn parse_baggage(raw: &Value) -> Vec<BaggageAllowance> {
    match raw {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(_) => Some(BaggageAllowance {
                    pax_type: text(item, &["paxType", "pax_type", "passengerType"]),
                    allowance: display(item, &["allowance", "weight", "pieces", "value"])?,
                }),
                other => scalar_display(other).map(|allowance| BaggageAllowance { pax_type: None, allowance }),
            })
            .collect(),
        Value::Object(map) => {
            if let Some(allowance) = display(raw, &["allowance", "weight", "pieces", "value"]) {
                return vec![BaggageAllowance {
                    pax_type: text(raw, &["paxType", "pax_type", "passengerType"]),
                    allowance,
                }];
            }
            // Keyed by passenger type, e.g. {"ADT": "30KG"}.
            map.iter()
                .filter_map(|(pax, value)| {
                    scalar_display(value).map(|allowance| BaggageAllowance { pax_type: Some(pax.clone()), allowance })
                })
                .collect()
        }
        other => scalar_display(other)
            .map(|allowance| vec![BaggageAllowance { pax_type: None, allowance }])
            .unwrap_or_default(),
    }
}

/// Minutes from `95`, `"95"`, `"01:35"`, `"1h 35m"` or `"PT1H35M"`.
pub fn parse_duration(raw: &Value) -> Option<u32> {
    match raw {
        Value::Number(n) => n.as_f64().filter(|m| *m >= 0.0).map(|m| m as u32),
        Value::String(s) => parse_duration_str(s),
        _ => None,
    }
}

fn parse_duration_str(input: &str) -> Option<u32> {
    let s = input.trim().to_ascii_uppercase();
    if s.is_empty() {
        return None;
    }
    if let Ok(minutes) = s.parse::<u32>() {
        return Some(minutes);
    }
    if let Some((h, m)) = s.split_once(':') {
        let hours: u32 = h.trim().parse().ok()?;
        let minutes: u32 = m.trim().get(..2).unwrap_or(m.trim()).parse().ok()?;
        return hours.checked_mul(60)?.checked_add(minutes);
    }

    let body = s.strip_prefix("PT").unwrap_or(&s);
    let mut total = 0u32;
    let mut digits = String::new();
    let mut matched = false;
    for c in body.chars() {
        match c {
            '0'..='9' => digits.push(c),
            'H' | 'M' => {
                let value: u32 = digits.parse().ok()?;
                let minutes = if c == 'H' { value.checked_mul(60)? } else { value };
                total = total.checked_add(minutes)?;
                digits.clear();
                matched = true;
            }
            ' ' => {}
            _ => return None,
        }
    }
    (matched && digits.is_empty()).then_some(total)
}

// ============================================================================
// Field helpers
// ============================================================================

fn first<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|key| raw.get(*key)).find(|v| !v.is_null())
}

fn text(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Airline and airport codes arrive either as strings or as `{code, name}`.
fn code(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|key| raw.get(*key)).find_map(|v| match v {
        Value::Object(_) => text(v, &["code", "iata", "iataCode"]),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

fn number(raw: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().filter_map(|key| raw.get(*key)).find_map(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    })
}

fn flag(raw: &Value, keys: &[&str]) -> bool {
    keys.iter().filter_map(|key| raw.get(*key)).any(|v| match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "y" | "1"),
        _ => false,
    })
}

fn display(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|key| raw.get(*key)).find_map(scalar_display)
}

fn scalar_display(v: &Value) -> Option<String> {
    match v {
        Value::Bool(true) => Some("Yes".to_string()),
        Value::Bool(false) => Some("No".to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn split_datetime(value: &str) -> (Option<String>, Option<String>) {
    match value.split_once(['T', ' ']) {
        Some((date, time)) => (Some(date.to_string()), Some(trim_time(time))),
        None => (Some(value.to_string()), None),
    }
}

fn trim_time(time: &str) -> String {
    time.get(..5).unwrap_or(time).to_string()
}
