//! Offer Price Lambda - Confirms the final price of a selected flight offer.

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::{json, Value};
use shared::http::{extract_body, json_response, LambdaResponse};
use shared::pricing::{extract_offer, format_pricing_response, validate_offer};
use shared::{AmadeusClient, Config};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

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

/// Turn the raw event into an offer the pricing endpoint will accept.
fn prepare_offer(event: Value) -> shared::Result<Value> {
    let body = extract_body(event)?;
    let offer = extract_offer(body)?;
    validate_offer(&offer)?;
    Ok(offer)
}

async fn price(state: &AppState, event: Value) -> shared::Result<Value> {
    let offer = prepare_offer(event)?;
    let pricing = state.amadeus.price_flight_offer(&offer).await?;
    let formatted = format_pricing_response(&pricing)?;
    info!("Successfully priced flight offer");
    Ok(formatted)
}

fn with_cors(response: LambdaResponse) -> LambdaResponse {
    response.with_header("Access-Control-Allow-Origin", "*")
}

fn failure_body(error: &shared::Error) -> Value {
    let message = if error.status_code() == 400 {
        "Please provide a complete flight offer object to price"
    } else {
        "Failed to price flight offer"
    };
    json!({"error": error.to_string(), "message": message})
}

async fn handler(state: Arc<AppState>, event: LambdaEvent<Value>) -> Result<LambdaResponse, Error> {
    let response = match price(&state, event.payload).await {
        Ok(formatted) => json_response(200, &formatted)?,
        Err(e) => {
            if e.status_code() == 400 {
                warn!("Rejected pricing request: {}", e);
            } else {
                error!("Offer pricing failed: {}", e);
            }
            json_response(e.status_code(), &failure_body(&e))?
        }
    };

    Ok(with_cors(response))
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
