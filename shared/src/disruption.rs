//! Disruption rebooking search.
//!
//! Scans `original_date ± days_range`, one search per day, and ranks what comes
//! back by closeness to the original date and then by price. Days whose search
//! fails are logged and contribute nothing; only request validation errors are
//! returned to the caller.

use chrono::{NaiveDate, TimeDelta};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::models::{
    CandidateOffer, Category, DisruptionOutcome, DisruptionRequest, NoAlternatives, Price,
    PriceRange, Priority, RecommendationSet, Segment,
};
use crate::search::{FlightOffer, FlightSearch, FlightSearchQuery};
use crate::{Error, Result};

/// Offers requested (and kept) per searched day.
const OFFERS_PER_DAY: usize = 3;
/// Length of the ranked alternatives list.
const MAX_ALTERNATIVES: usize = 10;
const SAME_DAY_CAP: usize = 3;
const NEXT_DAY_CAP: usize = 3;
const OTHER_DAYS_CAP: usize = 4;

/// Finds rebooking alternatives for a disrupted flight.
pub struct DisruptionFinder<'a, S: FlightSearch + ?Sized> {
    search: &'a S,
}

impl<'a, S: FlightSearch + ?Sized> DisruptionFinder<'a, S> {
    pub fn new(search: &'a S) -> Self {
        Self { search }
    }

    /// Scan the date window and build recommendations.
    pub async fn find_alternatives(&self, request: &DisruptionRequest) -> Result<DisruptionOutcome> {
        let origin = require_airport("origin", &request.origin)?;
        let destination = require_airport("destination", &request.destination)?;
        let original_date = parse_date(&request.original_date)?;
        let search_dates = date_window(original_date, request.days_range)?;

        info!(
            original_flight = %request.original_flight,
            %origin,
            %destination,
            %original_date,
            days_range = request.days_range,
            "Searching disruption alternatives"
        );

        let mut candidates = Vec::new();
        for (offset, search_date) in search_dates {
            let query = FlightSearchQuery::one_way(&origin, &destination, search_date, OFFERS_PER_DAY as u32);
            match self.search.search_one_way(&query).await {
                Ok(offers) => {
                    candidates.extend(
                        offers
                            .iter()
                            .take(OFFERS_PER_DAY)
                            .filter_map(|offer| to_candidate(offer, search_date, offset)),
                    );
                }
                Err(e) => {
                    warn!(offset, %search_date, "Skipping day after search failure: {}", e);
                }
            }
        }

        if candidates.is_empty() {
            info!(original_flight = %request.original_flight, "No alternatives found");
            return Ok(DisruptionOutcome::NoAlternatives(NoAlternatives::new(
                &request.original_flight,
                &request.disruption_reason,
            )));
        }

        rank(&mut candidates);

        let total_alternatives = candidates.len();
        let price_range = price_range(&candidates);
        let categories = categorize(&candidates);
        let alternatives: Vec<CandidateOffer> = candidates.into_iter().take(MAX_ALTERNATIVES).collect();

        info!(
            original_flight = %request.original_flight,
            total_alternatives,
            categories = categories.len(),
            "Disruption analysis complete"
        );

        Ok(DisruptionOutcome::Recommendations(RecommendationSet {
            success: true,
            message: format!(
                "Found {} alternative flights for disrupted flight {}",
                total_alternatives, request.original_flight
            ),
            original_flight: request.original_flight.clone(),
            origin,
            destination,
            original_date,
            disruption_reason: request.disruption_reason.clone(),
            total_alternatives,
            price_range,
            alternatives,
            categories,
        }))
    }
}

fn require_airport(field: &str, code: &str) -> Result<String> {
    let code = code.trim();
    if code.is_empty() {
        return Err(Error::Validation(format!("Missing required field: {}", field)));
    }
    Ok(code.to_uppercase())
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
        Error::Validation(format!("Invalid original_date '{}', expected YYYY-MM-DD: {}", raw, e))
    })
}

/// Every `(offset, date)` in `[-days_range, days_range]`, ascending.
fn date_window(original_date: NaiveDate, days_range: u32) -> Result<Vec<(i64, NaiveDate)>> {
    let range = i64::from(days_range);
    (-range..=range)
        .map(|offset| {
            original_date
                .checked_add_signed(TimeDelta::days(offset))
                .map(|date| (offset, date))
                .ok_or_else(|| Error::Validation(format!("days_range {} is out of range", days_range)))
        })
        .collect()
}

fn to_candidate(offer: &FlightOffer, date: NaiveDate, offset: i64) -> Option<CandidateOffer> {
    let amount = match offer.price.total.trim().parse::<Decimal>() {
        Ok(amount) => amount,
        Err(_) => {
            warn!(offer_id = %offer.id, total = %offer.price.total, "Dropping offer with unparseable price");
            return None;
        }
    };
    let Some(itinerary) = offer.itineraries.first() else {
        warn!(offer_id = %offer.id, "Dropping offer without itinerary");
        return None;
    };

    Some(CandidateOffer {
        date,
        date_offset_days: offset,
        price: Price {
            amount,
            currency: offer.price.currency.clone(),
        },
        duration: itinerary.duration.clone(),
        segments: itinerary
            .segments
            .iter()
            .map(|segment| Segment {
                departure_airport: segment.departure.iata_code.clone(),
                arrival_airport: segment.arrival.iata_code.clone(),
                departure_time: segment.departure.at.clone(),
                arrival_time: segment.arrival.at.clone(),
                carrier_code: segment.carrier_code.clone(),
                flight_number: segment.number.clone(),
            })
            .collect(),
    })
}

/// Closest date first, then cheapest. Stable, so ties keep scan order.
fn rank(candidates: &mut [CandidateOffer]) {
    candidates.sort_by(|a, b| {
        a.date_offset_days
            .abs()
            .cmp(&b.date_offset_days.abs())
            .then_with(|| a.price.amount.cmp(&b.price.amount))
    });
}

fn price_range(candidates: &[CandidateOffer]) -> PriceRange {
    let mut amounts = candidates.iter().map(|c| c.price.amount);
    let first = amounts.next().unwrap_or_default();
    let (min, max) = amounts.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
    PriceRange {
        min,
        max,
        currency: "USD".to_string(),
    }
}

/// Bucket ranked candidates. Offset -1 (the day before) falls in no bucket.
fn categorize(ranked: &[CandidateOffer]) -> Vec<Category> {
    let buckets: [(&str, Priority, usize, &str, fn(i64) -> bool); 3] = [
        (
            "Same Day Alternatives",
            Priority::High,
            SAME_DAY_CAP,
            "Book quickly - same-day flights fill up fast",
            |offset| offset == 0,
        ),
        (
            "Next Day Options",
            Priority::Medium,
            NEXT_DAY_CAP,
            "Good availability for next-day travel",
            |offset| offset == 1,
        ),
        (
            "Alternative Dates",
            Priority::Low,
            OTHER_DAYS_CAP,
            "More flexible dates with better pricing",
            |offset| offset.abs() > 1,
        ),
    ];

    buckets
        .into_iter()
        .filter_map(|(name, priority, cap, note, belongs)| {
            let members: Vec<&CandidateOffer> =
                ranked.iter().filter(|c| belongs(c.date_offset_days)).collect();
            if members.is_empty() {
                return None;
            }
            Some(Category {
                name: name.to_string(),
                priority,
                count: members.len(),
                offers: members.into_iter().take(cap).cloned().collect(),
                note: note.to_string(),
            })
        })
        .collect()
}
