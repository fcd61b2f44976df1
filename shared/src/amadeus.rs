//! Amadeus Self-Service API client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::cache::TtlCache;
use crate::search::{FlightOffer, FlightOffersResponse, FlightSearch, FlightSearchQuery};
use crate::secrets::{CredentialSource, SecretsManagerCredentials, StaticCredentials};
use crate::{Config, Error, Result};

const TOKEN_TIMEOUT: Duration = Duration::from_secs(10);
const API_TIMEOUT: Duration = Duration::from_secs(15);
/// Lifetime Amadeus reports for client-credentials tokens.
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 1799;
/// Tokens are dropped this long before the provider expires them.
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

/// How long to keep a token that the provider says lives `expires_in` seconds.
fn token_ttl(expires_in: Option<u64>) -> Duration {
    let lifetime = expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
    Duration::from_secs(lifetime.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS))
}

fn search_params(query: &FlightSearchQuery) -> Vec<(&'static str, String)> {
    vec![
        ("originLocationCode", query.origin.to_uppercase()),
        ("destinationLocationCode", query.destination.to_uppercase()),
        ("departureDate", query.departure_date.format("%Y-%m-%d").to_string()),
        ("adults", query.adults.to_string()),
        ("max", query.max_results.to_string()),
        ("currencyCode", query.currency.clone()),
    ]
}

/// Client for the flight-offers search and pricing endpoints.
///
/// Holds the OAuth token cache, so one instance should live for the whole
/// Lambda container.
pub struct AmadeusClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialSource>,
    token: TtlCache<String>,
}

impl AmadeusClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            credentials,
            token: TtlCache::new(),
        }
    }

    /// Build a client from configuration.
    ///
    /// Inline credentials win when both are set; otherwise they come from Secrets Manager.
    pub async fn from_config(config: &Config) -> Self {
        let credentials: Arc<dyn CredentialSource> =
            match (&config.amadeus_client_id, &config.amadeus_client_secret) {
                (Some(client_id), Some(client_secret)) => {
                    info!("Using Amadeus credentials from environment");
                    Arc::new(StaticCredentials::new(client_id.clone(), client_secret.clone()))
                }
                _ => {
                    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                        .region(aws_config::Region::new(config.aws_region.clone()))
                        .load()
                        .await;
                    Arc::new(SecretsManagerCredentials::new(
                        aws_sdk_secretsmanager::Client::new(&aws_config),
                        config.amadeus_secret_id.clone(),
                    ))
                }
            };

        Self::new(reqwest::Client::new(), config.amadeus_base_url.clone(), credentials)
    }

    async fn fetch_token(&self) -> Result<(String, Duration)> {
        info!("Fetching new Amadeus access token");
        let credentials = self.credentials.credentials().await?;

        let response = self
            .http
            .post(format!("{}/v1/security/oauth2/token", self.base_url))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
            ])
            .timeout(TOKEN_TIMEOUT)
            .send()
            .await?;

        let token: TokenResponse = check_status(response).await?.json().await?;
        let ttl = token_ttl(token.expires_in);
        info!(ttl_secs = ttl.as_secs(), "Obtained Amadeus access token");

        Ok((token.access_token, ttl))
    }

    /// Return a valid bearer token, fetching a fresh one when the cached token expired.
    pub async fn access_token(&self) -> Result<String> {
        self.token.get_or_refresh_with(|| self.fetch_token()).await
    }

    /// Search one-way flight offers.
    pub async fn search_flight_offers(&self, query: &FlightSearchQuery) -> Result<Vec<FlightOffer>> {
        let token = self.access_token().await?;

        let response = self
            .http
            .get(format!("{}/v2/shopping/flight-offers", self.base_url))
            .bearer_auth(&token)
            .query(&search_params(query))
            .timeout(API_TIMEOUT)
            .send()
            .await?;

        let response = self.check_authorized(response).await?;
        let body: FlightOffersResponse = response.json().await?;

        info!(
            origin = %query.origin,
            destination = %query.destination,
            departure_date = %query.departure_date,
            offers = body.data.len(),
            "Amadeus flight search complete"
        );

        Ok(body.data)
    }

    /// Confirm the price of an offer returned by a search.
    pub async fn price_flight_offer(&self, offer: &Value) -> Result<Value> {
        let token = self.access_token().await?;

        let payload = json!({
            "data": {
                "type": "flight-offers-pricing",
                "flightOffers": [offer],
            }
        });

        let offer_id = offer.get("id").and_then(Value::as_str).unwrap_or("unknown");
        info!(%offer_id, "Pricing flight offer");

        let response = self
            .http
            .post(format!("{}/v1/shopping/flight-offers/pricing", self.base_url))
            .bearer_auth(&token)
            .header("X-HTTP-Method-Override", "GET")
            .json(&payload)
            .timeout(API_TIMEOUT)
            .send()
            .await?;

        let response = self.check_authorized(response).await?;
        Ok(response.json().await?)
    }

    /// Like [`check_status`], but a 401 also discards the cached token.
    async fn check_authorized(&self, response: Response) -> Result<Response> {
        if response.status() == StatusCode::UNAUTHORIZED {
            self.token.invalidate().await;
        }
        check_status(response).await
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!(status = status.as_u16(), %body, "Amadeus API request failed");
    Err(Error::Upstream {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl FlightSearch for AmadeusClient {
    async fn search_one_way(&self, query: &FlightSearchQuery) -> Result<Vec<FlightOffer>> {
        self.search_flight_offers(query).await
    }
}
