//! Analyze Disruption Lambda - Finds rebooking alternatives for a disrupted flight.
//!
//! Invoked by the agent gateway with the cancelled flight's route and date. Scans
//! the surrounding days through Amadeus and returns ranked, categorized options.

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::Deserialize;
use serde_json::Value;
use shared::http::{error_to_response, extract_body, json_response, require_params, LambdaResponse};
use shared::{AmadeusClient, Config, DisruptionFinder, DisruptionOutcome, DisruptionRequest, FlightSearch};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const REQUIRED_PARAMS: &[&str] = &["original_flight", "origin", "destination", "original_date"];

/// Default and ceiling for the requested scan range.
#[derive(Debug, Clone, Copy)]
struct DaysRange {
    default: u32,
    max: u32,
}

/// Application state shared across invocations.
struct AppState {
    amadeus: AmadeusClient,
    days_range: DaysRange,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        Ok(Self {
            amadeus: AmadeusClient::from_config(&config).await,
            days_range: DaysRange {
                default: config.disruption_days_range,
                max: config.disruption_max_days_range,
            },
        })
    }
}

/// Tool parameters as sent by the gateway.
#[derive(Debug, Deserialize)]
struct DisruptionEvent {
    original_flight: String,
    origin: String,
    destination: String,
    original_date: String,
    disruption_reason: Option<String>,
    days_range: Option<u32>,
}

fn to_request(body: Value, days_range: DaysRange) -> shared::Result<DisruptionRequest> {
    let event: DisruptionEvent = serde_json::from_value(body)
        .map_err(|e| shared::Error::Validation(format!("Invalid request: {}", e)))?;

    let requested = event.days_range.unwrap_or(days_range.default);
    if requested > days_range.max {
        return Err(shared::Error::Validation(format!(
            "days_range {} exceeds the maximum of {}",
            requested, days_range.max
        )));
    }

    Ok(DisruptionRequest {
        original_flight: event.original_flight,
        origin: event.origin,
        destination: event.destination,
        original_date: event.original_date,
        disruption_reason: event
            .disruption_reason
            .unwrap_or_else(|| "cancellation".to_string()),
        days_range: requested,
    })
}

async fn analyze<S: FlightSearch + ?Sized>(
    search: &S,
    days_range: DaysRange,
    event: Value,
) -> shared::Result<DisruptionOutcome> {
    let body = extract_body(event)?;
    require_params(&body, REQUIRED_PARAMS)?;
    let request = to_request(body, days_range)?;

    info!(
        "Analyzing disruption of {} ({} -> {} on {})",
        request.original_flight, request.origin, request.destination, request.original_date
    );

    DisruptionFinder::new(search).find_alternatives(&request).await
}

/// Unsuccessful outcomes are reported as 500 so the gateway treats them as tool failures.
fn outcome_response(outcome: &DisruptionOutcome) -> shared::Result<LambdaResponse> {
    let status = if outcome.is_success() { 200 } else { 500 };
    json_response(status, outcome)
}

async fn handler(state: Arc<AppState>, event: LambdaEvent<Value>) -> Result<LambdaResponse, Error> {
    let response = match analyze(&state.amadeus, state.days_range, event.payload).await {
        Ok(outcome) => outcome_response(&outcome)?,
        Err(e) if e.status_code() == 400 => {
            warn!("Rejected disruption request: {}", e);
            error_to_response(&e)?
        }
        Err(e) => {
            error!("Disruption analysis failed: {}", e);
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
    use shared::search::{FlightEndpoint, FlightOffer, Itinerary, OfferPrice, OfferSegment};
    use shared::FlightSearchQuery;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns one offer per day priced by how far the day is from 2025-12-15.
    #[derive(Default)]
    struct DailySearch {
        calls: AtomicUsize,
    }

    #[shared::async_trait]
    impl FlightSearch for DailySearch {
        async fn search_one_way(&self, query: &FlightSearchQuery) -> shared::Result<Vec<FlightOffer>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let at = format!("{}T09:30:00", query.departure_date);
            Ok(vec![FlightOffer {
                id: query.departure_date.to_string(),
                price: OfferPrice {
                    total: "199.00".to_string(),
                    currency: "USD".to_string(),
                },
                itineraries: vec![Itinerary {
                    duration: "PT5H55M".to_string(),
                    segments: vec![OfferSegment {
                        id: None,
                        departure: FlightEndpoint {
                            iata_code: query.origin.clone(),
                            at: at.clone(),
                        },
                        arrival: FlightEndpoint {
                            iata_code: query.destination.clone(),
                            at,
                        },
                        carrier_code: "AA".to_string(),
                        number: "10".to_string(),
                        duration: None,
                    }],
                }],
            }])
        }
    }

    struct FailingSearch;

    #[shared::async_trait]
    impl FlightSearch for FailingSearch {
        async fn search_one_way(&self, _query: &FlightSearchQuery) -> shared::Result<Vec<FlightOffer>> {
            Err(shared::Error::Internal("connection reset".into()))
        }
    }

    fn limits(default: u32) -> DaysRange {
        DaysRange { default, max: 7 }
    }

    fn event() -> Value {
        json!({
            "original_flight": "AA123",
            "origin": "JFK",
            "destination": "LAX",
            "original_date": "2025-12-15"
        })
    }

    #[test]
    fn test_to_request_defaults() {
        let request = to_request(event(), limits(2)).unwrap();
        assert_eq!(request.disruption_reason, "cancellation");
        assert_eq!(request.days_range, 2);
    }

    #[test]
    fn test_to_request_explicit_range() {
        let mut body = event();
        body["days_range"] = json!(0);
        body["disruption_reason"] = json!("weather");
        let request = to_request(body, limits(3)).unwrap();
        assert_eq!(request.days_range, 0);
        assert_eq!(request.disruption_reason, "weather");
    }

    #[test]
    fn test_to_request_rejects_negative_range() {
        let mut body = event();
        body["days_range"] = json!(-1);
        let err = to_request(body, limits(3)).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_range_above_max_rejected_before_search() {
        let search = DailySearch::default();
        let mut body = event();
        body["days_range"] = json!(100000);
        let err = analyze(&search, limits(3), body).await.unwrap_err();

        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "Validation error: days_range 100000 exceeds the maximum of 7");
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);

        let mut body = event();
        body["days_range"] = json!(7);
        assert!(analyze(&search, limits(3), body).await.unwrap().is_success());
        assert_eq!(search.calls.load(Ordering::SeqCst), 15);
    }

    #[tokio::test]
    async fn test_analyze_api_gateway_body() {
        let search = DailySearch::default();
        let wrapped = json!({"body": event().to_string()});
        let outcome = analyze(&search, limits(1), wrapped).await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(search.calls.load(Ordering::SeqCst), 3);
        let response = outcome_response(&outcome).unwrap();
        assert_eq!(response.status_code, 200);
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["total_alternatives"], 3);
        assert_eq!(body["recommendations"][0]["name"], "Same Day Alternatives");
    }

    #[tokio::test]
    async fn test_analyze_missing_params() {
        let search = DailySearch::default();
        let err = analyze(&search, limits(3), json!({"origin": "JFK"})).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_analyze_bad_date() {
        let search = DailySearch::default();
        let mut body = event();
        body["original_date"] = json!("15-12-2025");
        let err = analyze(&search, limits(3), body).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_searches_fail() {
        let outcome = analyze(&FailingSearch, limits(3), event()).await.unwrap();
        let response = outcome_response(&outcome).unwrap();
        assert_eq!(response.status_code, 500);
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Unable to find alternative flights");
        assert_eq!(body["recommendations"], json!([]));
    }
}
