//! Search Flights Lambda - One-way flight search over Amadeus.

use chrono::NaiveDate;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::http::{error_to_response, extract_body, json_response, require_params, LambdaResponse};
use shared::{AmadeusClient, Config, FlightOffer, FlightSearch, FlightSearchQuery};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const REQUIRED_PARAMS: &[&str] = &["origin", "destination", "departure_date"];

struct AppState {
    amadeus: AmadeusClient,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        Ok(Self {
            amadeus: AmadeusClient::from_config(&config).await,
        })
    }
}

fn default_adults() -> u32 {
    1
}

fn default_max_results() -> u32 {
    5
}

#[derive(Debug, Deserialize)]
struct SearchFlightsEvent {
    origin: String,
    destination: String,
    departure_date: String,
    #[serde(default = "default_adults")]
    adults: u32,
    #[serde(default = "default_max_results")]
    max_results: u32,
}

#[derive(Debug, Serialize)]
struct SearchFlightsResponse {
    success: bool,
    message: String,
    flight_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    departure_date: Option<NaiveDate>,
    flights: Vec<FlightOffer>,
}

fn to_query(body: Value) -> shared::Result<FlightSearchQuery> {
    let event: SearchFlightsEvent = serde_json::from_value(body)
        .map_err(|e| shared::Error::Validation(format!("Invalid request: {}", e)))?;

    let departure_date = NaiveDate::parse_from_str(event.departure_date.trim(), "%Y-%m-%d").map_err(|e| {
        shared::Error::Validation(format!(
            "Invalid departure_date '{}', expected YYYY-MM-DD: {}",
            event.departure_date, e
        ))
    })?;
    if event.adults == 0 || event.max_results == 0 {
        return Err(shared::Error::Validation(
            "adults and max_results must be at least 1".to_string(),
        ));
    }

    let mut query = FlightSearchQuery::one_way(&event.origin, &event.destination, departure_date, event.max_results);
    query.adults = event.adults;
    Ok(query)
}

fn build_response(query: &FlightSearchQuery, mut offers: Vec<FlightOffer>) -> SearchFlightsResponse {
    offers.truncate(query.max_results as usize);

    if offers.is_empty() {
        return SearchFlightsResponse {
            success: false,
            message: format!(
                "No flights found from {} to {} on {}",
                query.origin, query.destination, query.departure_date
            ),
            flight_count: 0,
            origin: None,
            destination: None,
            departure_date: None,
            flights: Vec::new(),
        };
    }

    SearchFlightsResponse {
        success: true,
        message: format!(
            "Found {} flights from {} to {}",
            offers.len(),
            query.origin,
            query.destination
        ),
        flight_count: offers.len(),
        origin: Some(query.origin.clone()),
        destination: Some(query.destination.clone()),
        departure_date: Some(query.departure_date),
        flights: offers,
    }
}

async fn search<S: FlightSearch + ?Sized>(search: &S, event: Value) -> shared::Result<SearchFlightsResponse> {
    let body = extract_body(event)?;
    require_params(&body, REQUIRED_PARAMS)?;
    let query = to_query(body)?;

    info!(
        "Searching flights {} -> {} on {}",
        query.origin, query.destination, query.departure_date
    );

    let offers = search.search_one_way(&query).await?;
    Ok(build_response(&query, offers))
}

async fn handler(state: Arc<AppState>, event: LambdaEvent<Value>) -> Result<LambdaResponse, Error> {
    let response = match search(&state.amadeus, event.payload).await {
        Ok(result) => {
            let status = if result.success { 200 } else { 500 };
            json_response(status, &result)?
        }
        Err(e) if e.status_code() == 400 => {
            warn!("Rejected search request: {}", e);
            error_to_response(&e)?
        }
        Err(e) => {
            error!("Flight search failed: {}", e);
            error_to_response(&e)?
        }
    };

    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::search::{FlightEndpoint, Itinerary, OfferPrice, OfferSegment};
    use std::sync::Mutex;

    struct RecordingSearch {
        offers: Vec<FlightOffer>,
        last_query: Mutex<Option<FlightSearchQuery>>,
    }

    impl RecordingSearch {
        fn returning(count: usize) -> Self {
            Self {
                offers: (0..count).map(|i| offer(&i.to_string())).collect(),
                last_query: Mutex::new(None),
            }
        }
    }

    #[shared::async_trait]
    impl FlightSearch for RecordingSearch {
        async fn search_one_way(&self, query: &FlightSearchQuery) -> shared::Result<Vec<FlightOffer>> {
            *self.last_query.lock().unwrap() = Some(query.clone());
            Ok(self.offers.clone())
        }
    }

    fn offer(id: &str) -> FlightOffer {
        FlightOffer {
            id: id.to_string(),
            price: OfferPrice {
                total: "129.99".to_string(),
                currency: "USD".to_string(),
            },
            itineraries: vec![Itinerary {
                duration: "PT2H5M".to_string(),
                segments: vec![OfferSegment {
                    id: Some("1".to_string()),
                    departure: FlightEndpoint {
                        iata_code: "BOS".to_string(),
                        at: "2025-12-15T07:00:00".to_string(),
                    },
                    arrival: FlightEndpoint {
                        iata_code: "ORD".to_string(),
                        at: "2025-12-15T09:05:00".to_string(),
                    },
                    carrier_code: "UA".to_string(),
                    number: "512".to_string(),
                    duration: Some("PT2H5M".to_string()),
                }],
            }],
        }
    }

    #[tokio::test]
    async fn test_search_defaults_and_shape() {
        let search_client = RecordingSearch::returning(2);
        let event = json!({"origin": "bos", "destination": "ord", "departure_date": "2025-12-15"});
        let result = search(&search_client, event).await.unwrap();

        let query = search_client.last_query.lock().unwrap().clone().unwrap();
        assert_eq!(query.origin, "BOS");
        assert_eq!(query.adults, 1);
        assert_eq!(query.max_results, 5);

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["flight_count"], 2);
        assert_eq!(value["message"], "Found 2 flights from BOS to ORD");
        assert_eq!(value["departure_date"], "2025-12-15");
        assert_eq!(value["flights"][0]["price"]["total"], "129.99");
        assert_eq!(value["flights"][0]["itineraries"][0]["segments"][0]["carrierCode"], "UA");
        assert_eq!(value["flights"][0]["itineraries"][0]["segments"][0]["departure"]["iataCode"], "BOS");
    }

    #[tokio::test]
    async fn test_search_truncates_to_max_results() {
        let search_client = RecordingSearch::returning(4);
        let event = json!({"origin": "BOS", "destination": "ORD", "departure_date": "2025-12-15", "max_results": 2});
        let result = search(&search_client, event).await.unwrap();
        assert_eq!(result.flight_count, 2);
    }

    #[tokio::test]
    async fn test_search_no_flights() {
        let search_client = RecordingSearch::returning(0);
        let event = json!({"origin": "BOS", "destination": "ORD", "departure_date": "2025-12-15"});
        let result = search(&search_client, event).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.message, "No flights found from BOS to ORD on 2025-12-15");
    }

    #[tokio::test]
    async fn test_search_validation() {
        let search_client = RecordingSearch::returning(1);

        let err = search(&search_client, json!({"origin": "BOS"})).await.unwrap_err();
        assert_eq!(err.status_code(), 400);

        let event = json!({"origin": "BOS", "destination": "ORD", "departure_date": "12/15/2025"});
        let err = search(&search_client, event).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(search_client.last_query.lock().unwrap().is_none());
    }
}
