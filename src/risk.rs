//! Risk-aware route selection.
//!
//! Scores each candidate route by a distance/duration blend scaled by a
//! risk factor derived from the weather and severity signals, then picks
//! the lowest score. The risk factor is one multiplier shared by every
//! candidate in a query, so it scales the scores but can never change
//! which route wins; selection effectively minimizes the
//! distance/duration blend. Known property of the formula, kept as-is
//! because downstream display copy depends on the score magnitudes.

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::routing::Route;
use crate::severity::SeverityLabel;
use crate::weather::{WeatherCategory, WeatherObservation};

/// Risk multiplier per weather category. Total over the enum; anything
/// the classifier could not name lands on the `Unknown` arm.
pub fn weather_risk_weight(category: WeatherCategory) -> f64 {
    match category {
        WeatherCategory::Cloudy => 1.2,
        WeatherCategory::Foggy => 2.0,
        WeatherCategory::Rainy => 1.8,
        WeatherCategory::Shine => 1.0,
        WeatherCategory::Sunrise => 1.3,
        WeatherCategory::Unknown => 1.5,
    }
}

/// Risk multiplier per severity label. Total over the enum.
pub fn severity_risk_weight(label: SeverityLabel) -> f64 {
    match label {
        SeverityLabel::Medium => 1.5,
        SeverityLabel::High => 2.5,
        SeverityLabel::Critical => 4.0,
        SeverityLabel::Unknown => 2.0,
    }
}

const DISTANCE_WEIGHT: f64 = 0.3;
const DURATION_WEIGHT: f64 = 0.2;

/// Risk-adjusted score for one route. Monotone increasing in both
/// distance and duration.
pub fn route_score(route: &Route, risk_factor: f64) -> f64 {
    let distance_factor = route.distance_km / 10.0;
    let duration_factor = route.duration_min / 60.0;
    (distance_factor * DISTANCE_WEIGHT + duration_factor * DURATION_WEIGHT) * risk_factor
}

/// One scored candidate. Ephemeral, recomputed on every evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct RankedRoute {
    /// Index into the candidate list handed to `evaluate`
    pub index: usize,
    pub score: f64,
    /// 1 = recommended
    pub rank: usize,
}

/// Evaluation result: the recommended candidate plus the full ranking.
/// `ranking` is empty when the engine fell back to the first candidate
/// without scoring.
#[derive(Debug, Clone, Serialize)]
pub struct RouteSelection {
    pub selected: usize,
    pub ranking: Vec<RankedRoute>,
}

/// Ranks candidate routes under the current weather and severity signals.
///
/// With either signal absent or unknown there is nothing to weigh, and
/// the provider's primary suggestion (index 0) is kept. An empty
/// candidate list is a caller error, rejected rather than answered with
/// a meaningless index.
pub fn evaluate(
    routes: &[Route],
    weather: Option<&WeatherObservation>,
    severity: Option<SeverityLabel>,
) -> Result<RouteSelection> {
    if routes.is_empty() {
        return Err(Error::EmptyRouteSet);
    }

    let (category, label) = match (weather, severity) {
        (Some(obs), Some(label))
            if obs.category != WeatherCategory::Unknown && label != SeverityLabel::Unknown =>
        {
            (obs.category, label)
        }
        _ => {
            debug!("insufficient signal for weighted ranking, keeping primary route");
            return Ok(RouteSelection {
                selected: 0,
                ranking: Vec::new(),
            });
        }
    };

    let risk_factor = weather_risk_weight(category) * severity_risk_weight(label);

    let mut ranking: Vec<RankedRoute> = routes
        .iter()
        .enumerate()
        .map(|(index, route)| RankedRoute {
            index,
            score: route_score(route, risk_factor),
            rank: 0,
        })
        .collect();

    // Stable sort on (score, original index): ties keep the earlier candidate.
    ranking.sort_by(|a, b| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for (position, entry) in ranking.iter_mut().enumerate() {
        entry.rank = position + 1;
    }

    let selected = ranking[0].index;
    debug!(
        selected,
        risk_factor,
        candidates = routes.len(),
        "ranked candidate routes"
    );
    Ok(RouteSelection { selected, ranking })
}
