//! Configuration management for Lambda functions.

use std::env;

use crate::{Error, Result};

const DEFAULT_AMADEUS_BASE_URL: &str = "https://test.api.amadeus.com";
const DEFAULT_AMADEUS_SECRET_ID: &str = "autorescue/amadeus/credentials";
const DEFAULT_DAYS_RANGE: u32 = 3;
const DEFAULT_MAX_DAYS_RANGE: u32 = 7;
const DEFAULT_PERSONAL_INFO_BUCKET: &str = "autorescue-personal-info";
const DEFAULT_PERSONAL_INFO_KEY: &str = "personal_info.json";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Amadeus API base URL (test or production host)
    pub amadeus_base_url: String,
    /// Secrets Manager id holding `client_id` / `client_secret`
    pub amadeus_secret_id: String,
    /// Inline Amadeus client id, bypasses Secrets Manager when set with the secret
    pub amadeus_client_id: Option<String>,
    /// Inline Amadeus client secret
    pub amadeus_client_secret: Option<String>,
    /// AWS region
    pub aws_region: String,
    /// Days scanned on each side of a disrupted flight's date
    pub disruption_days_range: u32,
    /// Largest `days_range` a caller may request
    pub disruption_max_days_range: u32,
    /// S3 bucket holding the passenger profile
    pub personal_info_bucket: String,
    /// Object key of the passenger profile
    pub personal_info_key: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let disruption_days_range = parse_days(&lookup, "DISRUPTION_DAYS_RANGE", DEFAULT_DAYS_RANGE)?;
        let disruption_max_days_range =
            parse_days(&lookup, "DISRUPTION_MAX_DAYS_RANGE", DEFAULT_MAX_DAYS_RANGE)?;
        if disruption_days_range > disruption_max_days_range {
            return Err(Error::Config(format!(
                "DISRUPTION_DAYS_RANGE ({}) exceeds DISRUPTION_MAX_DAYS_RANGE ({})",
                disruption_days_range, disruption_max_days_range
            )));
        }

        Ok(Self {
            amadeus_base_url: lookup("AMADEUS_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_AMADEUS_BASE_URL.to_string()),
            amadeus_secret_id: lookup("AMADEUS_SECRET_ID")
                .unwrap_or_else(|| DEFAULT_AMADEUS_SECRET_ID.to_string()),
            amadeus_client_id: lookup("AMADEUS_CLIENT_ID"),
            amadeus_client_secret: lookup("AMADEUS_CLIENT_SECRET"),
            aws_region: lookup("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            disruption_days_range,
            disruption_max_days_range,
            personal_info_bucket: lookup("PERSONAL_INFO_BUCKET")
                .unwrap_or_else(|| DEFAULT_PERSONAL_INFO_BUCKET.to_string()),
            personal_info_key: lookup("PERSONAL_INFO_KEY")
                .unwrap_or_else(|| DEFAULT_PERSONAL_INFO_KEY.to_string()),
        })
    }
}

fn parse_days<F>(lookup: &F, key: &str, default: u32) -> Result<u32>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} must be a non-negative integer, got '{}'", key, raw))),
        None => Ok(default),
    }
}
