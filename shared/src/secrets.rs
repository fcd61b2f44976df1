//! AWS Secrets Manager integration.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_secretsmanager::Client as SecretsClient;
use serde::Deserialize;
use tracing::info;

use crate::cache::TtlCache;
use crate::{Error, Result};

/// How long fetched credentials are reused before Secrets Manager is asked again.
pub const CREDENTIALS_TTL: Duration = Duration::from_secs(3600);

/// Amadeus API credentials from Secrets Manager.
#[derive(Debug, Clone, Deserialize)]
pub struct AmadeusCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Source of Amadeus API credentials.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn credentials(&self) -> Result<AmadeusCredentials>;
}

/// Get a secret string value from Secrets Manager.
pub async fn get_secret(client: &SecretsClient, secret_id: &str) -> Result<String> {
    let response = client
        .get_secret_value()
        .secret_id(secret_id)
        .send()
        .await
        .map_err(|e| Error::Aws(format!("Failed to get secret: {}", e)))?;

    response
        .secret_string()
        .map(str::to_string)
        .ok_or_else(|| Error::Aws("Secret has no string value".to_string()))
}

/// Parse the JSON document stored in the Amadeus secret.
pub fn parse_amadeus_credentials(secret_string: &str) -> Result<AmadeusCredentials> {
    serde_json::from_str(secret_string)
        .map_err(|e| Error::Aws(format!("Failed to parse Amadeus credentials: {}", e)))
}

/// Credentials read from Secrets Manager and cached for [`CREDENTIALS_TTL`].
pub struct SecretsManagerCredentials {
    client: SecretsClient,
    secret_id: String,
    cache: TtlCache<AmadeusCredentials>,
}

impl SecretsManagerCredentials {
    pub fn new(client: SecretsClient, secret_id: impl Into<String>) -> Self {
        Self {
            client,
            secret_id: secret_id.into(),
            cache: TtlCache::new(),
        }
    }

    async fn fetch(&self) -> Result<AmadeusCredentials> {
        info!(secret_id = %self.secret_id, "Fetching Amadeus credentials from Secrets Manager");
        let secret_string = get_secret(&self.client, &self.secret_id).await?;
        parse_amadeus_credentials(&secret_string)
    }
}

#[async_trait]
impl CredentialSource for SecretsManagerCredentials {
    async fn credentials(&self) -> Result<AmadeusCredentials> {
        self.cache.get_or_refresh(CREDENTIALS_TTL, || self.fetch()).await
    }
}

/// Fixed credentials, e.g. from `AMADEUS_CLIENT_ID` / `AMADEUS_CLIENT_SECRET`.
pub struct StaticCredentials(AmadeusCredentials);

impl StaticCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self(AmadeusCredentials {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        })
    }
}

#[async_trait]
impl CredentialSource for StaticCredentials {
    async fn credentials(&self) -> Result<AmadeusCredentials> {
        Ok(self.0.clone())
    }
}
