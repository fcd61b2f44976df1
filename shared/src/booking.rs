//! Booking confirmation for a priced flight offer.
//!
//! The passenger profile is read from S3. When it cannot be loaded the booking
//! is confirmed under a placeholder passenger instead of failing.

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{Config, Error, Result};

const NOT_AVAILABLE: &str = "N/A";

fn default_first_name() -> String {
    "Passenger".to_string()
}

fn default_email() -> String {
    "passenger@example.com".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassengerName {
    #[serde(default = "default_first_name")]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl Default for PassengerName {
    fn default() -> Self {
        Self {
            first_name: default_first_name(),
            last_name: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Contact {
    #[serde(default = "default_email")]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Default for Contact {
    fn default() -> Self {
        Self {
            email: default_email(),
            phone: None,
        }
    }
}

/// Public passenger details stored in `personal_info.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PassengerInfo {
    #[serde(default)]
    pub name: PassengerName,
    #[serde(default)]
    pub contact: Contact,
}

impl PassengerInfo {
    /// Stand-in used when the stored profile is unavailable.
    pub fn placeholder() -> Self {
        Self {
            name: PassengerName {
                first_name: "John".to_string(),
                last_name: "Doe".to_string(),
            },
            contact: Contact {
                email: default_email(),
                phone: Some("+1-555-0100".to_string()),
            },
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.name.first_name, self.name.last_name)
            .trim()
            .to_string()
    }
}

/// Where the traveling passenger's profile comes from.
#[async_trait]
pub trait PassengerSource: Send + Sync {
    async fn passenger(&self) -> Result<PassengerInfo>;
}

/// Passenger profile stored as a JSON object in S3.
pub struct S3PassengerInfo {
    client: S3Client,
    bucket: String,
    key: String,
}

impl S3PassengerInfo {
    pub fn new(client: S3Client, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub async fn from_config(config: &Config) -> Self {
        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.aws_region.clone()))
            .load()
            .await;
        Self::new(
            S3Client::new(&aws_config),
            config.personal_info_bucket.clone(),
            config.personal_info_key.clone(),
        )
    }
}

#[async_trait]
impl PassengerSource for S3PassengerInfo {
    async fn passenger(&self) -> Result<PassengerInfo> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await
            .map_err(|e| Error::Aws(format!("Failed to get s3://{}/{}: {}", self.bucket, self.key, e)))?;

        let bytes = object
            .body
            .collect()
            .await
            .map_err(|e| Error::Aws(format!("Failed to read s3://{}/{}: {}", self.bucket, self.key, e)))?
            .into_bytes();

        let passenger = serde_json::from_slice(&bytes).map_err(|e| {
            Error::Aws(format!("Failed to parse s3://{}/{}: {}", self.bucket, self.key, e))
        })?;
        info!(bucket = %self.bucket, key = %self.key, "Loaded passenger info");
        Ok(passenger)
    }
}

/// Load the passenger, falling back to [`PassengerInfo::placeholder`].
pub async fn load_passenger<P: PassengerSource + ?Sized>(source: &P) -> PassengerInfo {
    match source.passenger().await {
        Ok(passenger) => passenger,
        Err(e) => {
            warn!("Using placeholder passenger: {}", e);
            PassengerInfo::placeholder()
        }
    }
}

/// Pull the offer out of a booking request.
///
/// The offer must be an object with at least one itinerary.
pub fn validate_booking_request(body: Value) -> Result<Value> {
    let invalid = || Error::Validation("Invalid booking request. Required field: flight_offer".to_string());

    let offer = match body {
        Value::Object(mut map) => map.remove("flight_offer").ok_or_else(invalid)?,
        _ => return Err(invalid()),
    };
    let has_itinerary = offer
        .get("itineraries")
        .and_then(Value::as_array)
        .is_some_and(|itineraries| !itineraries.is_empty());
    if !offer.is_object() || !has_itinerary {
        return Err(invalid());
    }

    Ok(offer)
}

/// `AR` followed by the UTC booking time, e.g. `AR20251215080000`.
pub fn booking_reference(booked_at: DateTime<Utc>) -> String {
    format!("AR{}", booked_at.format("%Y%m%d%H%M%S"))
}

fn text_at<'a>(value: Option<&'a Value>, pointer: &str) -> Option<&'a str> {
    value.and_then(|v| v.pointer(pointer)).and_then(Value::as_str)
}

/// Build the confirmation returned to the caller.
pub fn confirm_booking(offer: &Value, passenger: &PassengerInfo, booked_at: DateTime<Utc>) -> Value {
    let segments = offer
        .pointer("/itineraries/0/segments")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let first = segments.first();
    let last = segments.last();

    let origin = text_at(first, "/departure/iataCode").unwrap_or(NOT_AVAILABLE);
    let destination = text_at(last, "/arrival/iataCode").unwrap_or(NOT_AVAILABLE);
    let departure = text_at(first, "/departure/at").unwrap_or(NOT_AVAILABLE);
    let carrier = text_at(first, "/carrierCode").unwrap_or(NOT_AVAILABLE);
    let flight_number = format!("{}{}", carrier, text_at(first, "/number").unwrap_or_default());
    let price = format!(
        "{} {}",
        text_at(Some(offer), "/price/currency").unwrap_or("USD"),
        text_at(Some(offer), "/price/total").unwrap_or(NOT_AVAILABLE)
    );

    let reference = booking_reference(booked_at);
    let name = passenger.full_name();
    let email = &passenger.contact.email;

    json!({
        "success": true,
        "message": format!("Flight booked successfully for {}!", name),
        "booking_reference": reference,
        "confirmation": {
            "bookingNumber": reference,
            "status": "CONFIRMED",
            "passengerName": name,
            "confirmationEmail": email,
            "flightDetails": {
                "origin": origin,
                "destination": destination,
                "departureDate": departure,
                "carrier": carrier,
                "flightNumber": flight_number,
                "price": price,
            },
            "message": format!("Your booking confirmation has been sent to {}", email),
        },
        "booking_details": {
            "confirmation_number": reference,
            "passenger": {"name": name, "email": email},
            "flight": {
                "from": origin,
                "to": destination,
                "date": departure,
                "airline": carrier,
                "flight_number": flight_number,
                "total_price": price,
            },
            "status": "CONFIRMED",
        },
    })
}
