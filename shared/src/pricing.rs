//! Flight-offer pricing: request checks and response formatting.

use serde_json::{json, Value};

use crate::{Error, Result};

/// Pull the offer out of a tool request.
///
/// Accepts `{"flight_offer": {...}}` or a bare offer object (recognized by a
/// `type` or `id` key). Adds `type: "flight-offer"` when it is missing.
pub fn extract_offer(body: Value) -> Result<Value> {
    let mut offer = match body {
        Value::Object(mut map) if map.contains_key("flight_offer") => {
            map.remove("flight_offer").unwrap_or(Value::Null)
        }
        Value::Object(map) if map.contains_key("type") || map.contains_key("id") => Value::Object(map),
        _ => Value::Null,
    };

    let Some(fields) = offer.as_object_mut() else {
        return Err(Error::Validation("Missing required parameter: flight_offer".to_string()));
    };
    fields
        .entry("type")
        .or_insert_with(|| Value::String("flight-offer".to_string()));

    Ok(offer)
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Check the fields the pricing endpoint refuses to work without.
pub fn validate_offer(offer: &Value) -> Result<()> {
    if !is_present(offer.get("travelerPricings")) {
        return Err(Error::Validation(
            "Missing required field: travelerPricings. The complete flight offer object must be provided."
                .to_string(),
        ));
    }
    if !is_present(offer.get("validatingAirlineCodes")) {
        return Err(Error::Validation(
            "Missing required field: validatingAirlineCodes. The complete flight offer object must be provided."
                .to_string(),
        ));
    }

    let segments = offer
        .get("itineraries")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|itinerary| itinerary.get("segments").and_then(Value::as_array))
        .flatten();
    for segment in segments {
        if segment.get("id").is_none() {
            return Err(Error::Validation(
                "Missing required field: segment ID. The complete flight offer object with all segment IDs must be provided."
                    .to_string(),
            ));
        }
    }

    Ok(())
}

/// Cabin booked for `segment_id`, falling back to economy.
fn cabin_for(traveler_pricings: &[Value], segment_id: Option<&Value>) -> Value {
    traveler_pricings
        .first()
        .and_then(|tp| tp.get("fareDetailsBySegment"))
        .and_then(Value::as_array)
        .and_then(|fares| {
            fares
                .iter()
                .find(|fare| segment_id.is_some() && fare.get("segmentId") == segment_id)
        })
        .and_then(|fare| fare.get("cabin"))
        .cloned()
        .unwrap_or_else(|| json!("ECONOMY"))
}

fn field_or(value: &Value, key: &str, default: Value) -> Value {
    value.get(key).cloned().unwrap_or(default)
}

/// Reshape the pricing endpoint's response into the tool's summary.
pub fn format_pricing_response(pricing: &Value) -> Result<Value> {
    let priced_offer = pricing
        .pointer("/data/flightOffers")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Internal("Invalid pricing response structure".to_string()))?
        .first()
        .ok_or_else(|| Error::Internal("No flight offers in pricing response".to_string()))?;

    let empty = Vec::new();
    let price = priced_offer.get("price").cloned().unwrap_or_else(|| json!({}));
    let traveler_pricings = priced_offer
        .get("travelerPricings")
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    let itineraries = priced_offer
        .get("itineraries")
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    let total = field_or(&price, "total", json!("0.00"));

    Ok(json!({
        "offer_id": priced_offer.get("id"),
        "pricing": {
            "currency": field_or(&price, "currency", json!("USD")),
            "total": total.clone(),
            "base": field_or(&price, "base", json!("0.00")),
            "fees": field_or(&price, "fees", json!([])),
            "grand_total": field_or(&price, "grandTotal", total),
            "taxes": field_or(&price, "taxes", json!([])),
        },
        "booking_info": {
            "instant_ticketing_required": field_or(priced_offer, "instantTicketingRequired", json!(false)),
            "last_ticketing_date": priced_offer.get("lastTicketingDate"),
            "last_ticketing_datetime": priced_offer.get("lastTicketingDateTime"),
            "number_of_bookable_seats": field_or(priced_offer, "numberOfBookableSeats", json!(0)),
            "validating_airline_codes": field_or(priced_offer, "validatingAirlineCodes", json!([])),
        },
        "itineraries": itineraries.iter().map(|itinerary| json!({
            "duration": itinerary.get("duration"),
            "segments": itinerary
                .get("segments")
                .and_then(Value::as_array)
                .unwrap_or(&empty)
                .iter()
                .map(|segment| json!({
                    "departure": segment.get("departure"),
                    "arrival": segment.get("arrival"),
                    "carrier_code": segment.get("carrierCode"),
                    "flight_number": segment.get("number"),
                    "aircraft": segment.pointer("/aircraft/code"),
                    "cabin": cabin_for(traveler_pricings, segment.get("id")),
                }))
                .collect::<Vec<_>>(),
        })).collect::<Vec<_>>(),
        "travelers": traveler_pricings.iter().map(|tp| json!({
            "traveler_id": tp.get("travelerId"),
            "traveler_type": field_or(tp, "travelerType", json!("ADULT")),
            "fare_option": field_or(tp, "fareOption", json!("STANDARD")),
            "price": field_or(tp, "price", json!({})),
            "fare_details": field_or(tp, "fareDetailsBySegment", json!([])),
        })).collect::<Vec<_>>(),
        "pricing_options": field_or(priced_offer, "pricingOptions", json!({})),
        "raw_offer": priced_offer,
    }))
}
