//! One-way flight search capability and the provider's offer shape.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Parameters for a single one-way search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightSearchQuery {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub adults: u32,
    pub max_results: u32,
    pub currency: String,
}

impl FlightSearchQuery {
    /// Query for one adult, priced in USD.
    pub fn one_way(origin: &str, destination: &str, departure_date: NaiveDate, max_results: u32) -> Self {
        Self {
            origin: origin.to_uppercase(),
            destination: destination.to_uppercase(),
            departure_date,
            adults: 1,
            max_results,
            currency: "USD".to_string(),
        }
    }
}

/// Envelope returned by the flight-offers search endpoint.
#[derive(Debug, Deserialize)]
pub struct FlightOffersResponse {
    #[serde(default)]
    pub data: Vec<FlightOffer>,
}

/// A priced itinerary as returned by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightOffer {
    #[serde(default)]
    pub id: String,
    pub price: OfferPrice,
    #[serde(default)]
    pub itineraries: Vec<Itinerary>,
}

/// Price is a decimal string, e.g. `"245.60"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferPrice {
    pub total: String,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Itinerary {
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub segments: Vec<OfferSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferSegment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub departure: FlightEndpoint,
    pub arrival: FlightEndpoint,
    pub carrier_code: String,
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightEndpoint {
    pub iata_code: String,
    pub at: String,
}

/// Anything that can answer a one-way flight search.
#[async_trait]
pub trait FlightSearch: Send + Sync {
    /// Search offers for a single departure date.
    async fn search_one_way(&self, query: &FlightSearchQuery) -> Result<Vec<FlightOffer>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_response() {
        let json = r#"{
            "meta": {"count": 1},
            "data": [{
                "type": "flight-offer",
                "id": "1",
                "price": {"currency": "USD", "total": "245.60", "base": "200.00"},
                "itineraries": [{
                    "duration": "PT6H10M",
                    "segments": [{
                        "id": "1",
                        "departure": {"iataCode": "JFK", "terminal": "4", "at": "2025-12-15T08:00:00"},
                        "arrival": {"iataCode": "LAX", "at": "2025-12-15T11:10:00"},
                        "carrierCode": "B6",
                        "number": "23",
                        "duration": "PT6H10M"
                    }]
                }]
            }]
        }"#;

        let response: FlightOffersResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.data.len(), 1);
        let offer = &response.data[0];
        assert_eq!(offer.price.total, "245.60");
        assert_eq!(offer.itineraries[0].segments[0].carrier_code, "B6");
        assert_eq!(offer.itineraries[0].segments[0].departure.iata_code, "JFK");
    }

    #[test]
    fn test_missing_data_is_empty() {
        let response: FlightOffersResponse = serde_json::from_str(r#"{"meta": {"count": 0}}"#).unwrap();
        assert!(response.data.is_empty());
    }

    #[test]
    fn test_one_way_normalizes_codes() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 15).unwrap();
        let query = FlightSearchQuery::one_way("jfk", "lax", date, 3);
        assert_eq!(query.origin, "JFK");
        assert_eq!(query.destination, "LAX");
        assert_eq!(query.adults, 1);
        assert_eq!(query.currency, "USD");
    }
}
