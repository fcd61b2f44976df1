//! Book Flight Lambda - Confirms a booking for a priced flight offer.

use chrono::{DateTime, Utc};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;
use shared::booking::{confirm_booking, load_passenger, validate_booking_request};
use shared::http::{error_to_response, extract_body, json_response, LambdaResponse};
use shared::{Config, PassengerSource, S3PassengerInfo};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

struct AppState {
    passengers: S3PassengerInfo,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        Ok(Self {
            passengers: S3PassengerInfo::from_config(&config).await,
        })
    }
}

async fn book<P: PassengerSource + ?Sized>(
    passengers: &P,
    event: Value,
    booked_at: DateTime<Utc>,
) -> shared::Result<Value> {
    let body = extract_body(event)?;
    let offer = validate_booking_request(body)?;
    let passenger = load_passenger(passengers).await;
    let confirmation = confirm_booking(&offer, &passenger, booked_at);

    let reference = confirmation["booking_reference"].as_str().unwrap_or_default();
    info!(%reference, "Flight booking confirmed");
    Ok(confirmation)
}

async fn handler(state: Arc<AppState>, event: LambdaEvent<Value>) -> Result<LambdaResponse, Error> {
    let response = match book(&state.passengers, event.payload, Utc::now()).await {
        Ok(confirmation) => json_response(201, &confirmation)?,
        Err(e) if e.status_code() == 400 => {
            warn!("Rejected booking request: {}", e);
            error_to_response(&e)?
        }
        Err(e) => {
            error!("Flight booking failed: {}", e);
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
