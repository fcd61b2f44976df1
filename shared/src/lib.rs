//! Shared library for AutoRescue Lambda functions.
//!
//! This crate provides the disruption rebooking search, the Amadeus client,
//! credential caching, booking confirmation and the request/response helpers
//! used by every tool Lambda.

pub mod amadeus;
pub mod booking;
pub mod cache;
pub mod config;
pub mod disruption;
pub mod error;
pub mod http;
pub mod models;
pub mod pricing;
pub mod search;
pub mod secrets;

pub use amadeus::AmadeusClient;
pub use async_trait::async_trait;
pub use booking::{PassengerInfo, PassengerSource, S3PassengerInfo};
pub use cache::TtlCache;
pub use config::Config;
pub use disruption::DisruptionFinder;
pub use error::{Error, Result};
pub use models::{
    CandidateOffer, Category, DisruptionOutcome, DisruptionRequest, ErrorResponse, NoAlternatives,
    Price, PriceRange, Priority, RecommendationSet, Segment,
};
pub use search::{FlightOffer, FlightSearch, FlightSearchQuery};
pub use secrets::{AmadeusCredentials, CredentialSource, SecretsManagerCredentials, StaticCredentials};
