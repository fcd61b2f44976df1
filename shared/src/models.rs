//! Shared data models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Body of a failed tool response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

/// A disrupted itinerary to find alternatives for.
#[derive(Debug, Clone)]
pub struct DisruptionRequest {
    pub original_flight: String,
    pub origin: String,
    pub destination: String,
    /// ISO `YYYY-MM-DD`; validated by the finder.
    pub original_date: String,
    pub disruption_reason: String,
    pub days_range: u32,
}

/// Amount is kept exactly as quoted, e.g. `"245.60"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Price {
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub carrier_code: String,
    pub flight_number: String,
}

/// One alternative flight found during a disruption scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateOffer {
    pub date: NaiveDate,
    pub date_offset_days: i64,
    pub price: Price,
    pub duration: String,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// A bucket of alternatives grouped by how far they are from the original date.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub name: String,
    pub priority: Priority,
    /// Bucket size before the per-category cap.
    pub count: usize,
    pub offers: Vec<CandidateOffer>,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
    pub currency: String,
}

/// Ranked, categorized rebooking options.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationSet {
    pub success: bool,
    pub message: String,
    pub original_flight: String,
    pub origin: String,
    pub destination: String,
    pub original_date: NaiveDate,
    pub disruption_reason: String,
    pub total_alternatives: usize,
    pub price_range: PriceRange,
    pub alternatives: Vec<CandidateOffer>,
    #[serde(rename = "recommendations")]
    pub categories: Vec<Category>,
}

/// Returned when every day of the scan came back empty or failed.
#[derive(Debug, Clone, Serialize)]
pub struct NoAlternatives {
    pub success: bool,
    pub message: String,
    pub original_flight: String,
    pub disruption_reason: String,
    pub recommendations: Vec<Category>,
}

impl NoAlternatives {
    pub fn new(original_flight: &str, disruption_reason: &str) -> Self {
        Self {
            success: false,
            message: "Unable to find alternative flights".to_string(),
            original_flight: original_flight.to_string(),
            disruption_reason: disruption_reason.to_string(),
            recommendations: Vec::new(),
        }
    }
}

/// Result of a disruption scan.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DisruptionOutcome {
    Recommendations(RecommendationSet),
    NoAlternatives(NoAlternatives),
}

impl DisruptionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DisruptionOutcome::Recommendations(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_keeps_quoted_scale() {
        let price = Price {
            amount: "245.60".parse().unwrap(),
            currency: "USD".to_string(),
        };
        let value = serde_json::to_value(&price).unwrap();
        assert_eq!(value["amount"], "245.60");
    }

    #[test]
    fn test_error_response_shape() {
        let value = serde_json::to_value(ErrorResponse::new("boom")).unwrap();
        assert_eq!(value, serde_json::json!({"success": false, "error": "boom"}));
    }

    #[test]
    fn test_no_alternatives_shape() {
        let outcome = DisruptionOutcome::NoAlternatives(NoAlternatives::new("AA123", "weather"));
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["message"], "Unable to find alternative flights");
        assert_eq!(value["original_flight"], "AA123");
        assert_eq!(value["disruption_reason"], "weather");
        assert_eq!(value["recommendations"], serde_json::json!([]));
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_priority_serializes_uppercase() {
        assert_eq!(serde_json::to_value(Priority::High).unwrap(), "HIGH");
        assert_eq!(serde_json::to_value(Priority::Low).unwrap(), "LOW");
    }
}
