//! Offer extraction from provider responses.
//!
//! The provider has no single response shape. Extraction is an ordered chain
//! of strategies and the first one that finds an array wins. Nothing in here
//! fails: an unrecognised payload is simply zero offers.
//!
//! The fallback walk visits object members in serde_json's map order, which
//! is sorted by key (no `preserve_order`), not document order. When two
//! sibling arrays both look like offers, the one under the smaller key wins.

use serde_json::Value;

use crate::models::FlightOffer;
use crate::parse::offer_from_value;

/// Keys that mark an object as offer-shaped during the fallback walk.
const OFFER_KEYS: [&str; 6] = ["fare", "segments", "flights", "ondPairs", "fareDetails", "total"];

const MAX_WALK_DEPTH: usize = 4;

const WELL_KNOWN_PATHS: [&[&str]; 7] = [
    &["flights"],
    &["itineraries"],
    &["results"],
    &["response", "content", "flights"],
    &["parsed_results"],
    &["parsed_results", "flights"],
    &["parsed_results", "results"],
];

type Strategy = fn(&Value) -> Option<&Vec<Value>>;

const STRATEGIES: [(&str, Strategy); 3] = [
    ("bare_array", bare_array),
    ("well_known_path", well_known_path),
    ("offer_shaped_walk", offer_shaped_walk),
];

/// Raw offer objects in provider order, or an empty list.
pub fn extract_offers(response: &Value) -> Vec<Value> {
    for (name, strategy) in STRATEGIES {
        if let Some(items) = strategy(response) {
            tracing::debug!(strategy = name, count = items.len(), "Extracted offers from provider response");
            return items.clone();
        }
    }
    tracing::debug!("No offer array found in provider response");
    Vec::new()
}

/// Extract and map offers into the canonical model. Entries that are not
/// JSON objects are dropped.
pub fn normalize_offers(response: &Value, default_supplier_code: &str) -> Vec<FlightOffer> {
    extract_offers(response)
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| offer_from_value(raw, index, default_supplier_code))
        .collect()
}

fn bare_array(response: &Value) -> Option<&Vec<Value>> {
    response.as_array()
}

fn well_known_path(response: &Value) -> Option<&Vec<Value>> {
    WELL_KNOWN_PATHS.iter().find_map(|path| {
        path.iter()
            .try_fold(response, |node, key| node.get(*key))
            .and_then(Value::as_array)
    })
}

fn offer_shaped_walk(response: &Value) -> Option<&Vec<Value>> {
    walk(response, 0)
}

fn walk(node: &Value, depth: usize) -> Option<&Vec<Value>> {
    match node {
        Value::Array(items) => {
            if looks_like_offer_list(items) {
                return Some(items);
            }
            if depth >= MAX_WALK_DEPTH {
                return None;
            }
            items.iter().find_map(|child| walk(child, depth + 1))
        }
        Value::Object(map) => {
            if depth >= MAX_WALK_DEPTH {
                return None;
            }
            map.values().find_map(|child| walk(child, depth + 1))
        }
        _ => None,
    }
}

fn looks_like_offer_list(items: &[Value]) -> bool {
    items
        .first()
        .and_then(Value::as_object)
        .is_some_and(|first| OFFER_KEYS.iter().any(|key| first.contains_key(*key)))
}
