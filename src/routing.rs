//! Candidate routes and the OSRM route-provider adapter.
//!
//! OSRM reports distances in meters and durations in seconds with a
//! precision-5 encoded polyline geometry; everything downstream works in
//! kilometers, minutes, and (lat, lon) points, so the conversion happens
//! here at the boundary.

use std::time::Duration;

use geo::prelude::*;
use geo::Point;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// Display styling applied by position: primary route first, then
/// alternatives in progressively thinner lines.
const ROUTE_COLORS: [&str; 3] = ["#1E90FF", "#32CD32", "#9932CC"];
const ROUTE_WEIGHTS: [u32; 3] = [5, 4, 3];

/// One candidate route. Order within a query is the provider's order;
/// index 0 is the provider's primary suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct Route {
    /// Ordered (lat, lon) points along the route
    pub geometry: Vec<[f64; 2]>,
    pub distance_km: f64,
    pub duration_min: f64,
    pub color: String,
    pub weight: u32,
}

/// Great-circle length of an ordered (lat, lon) point sequence, km.
pub fn polyline_length_km(points: &[[f64; 2]]) -> f64 {
    points
        .iter()
        .tuple_windows()
        .map(|(a, b)| {
            Point::new(a[1], a[0]).haversine_distance(&Point::new(b[1], b[0])) / 1000.0
        })
        .sum()
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    /// Encoded polyline, precision 5
    geometry: String,
    /// Meters
    distance: f64,
    /// Seconds
    duration: f64,
}

fn routes_from_response(resp: OsrmResponse) -> Vec<Route> {
    if resp.code != "Ok" {
        warn!(
            code = %resp.code,
            detail = resp.message.as_deref().unwrap_or(""),
            "OSRM returned no routes"
        );
        return Vec::new();
    }

    let mut routes = Vec::with_capacity(resp.routes.len());
    for (i, item) in resp.routes.into_iter().enumerate() {
        let geometry = match polyline::decode_polyline(&item.geometry, 5) {
            Ok(line) => line
                .points()
                .map(|p| [p.y(), p.x()]) // polyline decodes to (lon, lat)
                .collect::<Vec<_>>(),
            Err(e) => {
                warn!(route = i, error = %e, "skipping route with undecodable geometry");
                continue;
            }
        };
        if geometry.is_empty() {
            continue;
        }
        debug!(
            route = i,
            reported_km = item.distance / 1000.0,
            geometry_km = polyline_length_km(&geometry),
            "decoded candidate route"
        );
        routes.push(Route {
            geometry,
            distance_km: item.distance / 1000.0,
            duration_min: item.duration / 60.0,
            color: ROUTE_COLORS[i % ROUTE_COLORS.len()].to_string(),
            weight: ROUTE_WEIGHTS[i % ROUTE_WEIGHTS.len()],
        });
    }
    routes
}

/// HTTP client for an OSRM `route` service.
pub struct OsrmClient {
    http: reqwest::Client,
    base_url: String,
}

impl OsrmClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch candidate driving routes between two (lat, lon) coordinates.
    /// A reachable OSRM that finds no route yields an empty list; only
    /// transport/decoding failures are errors.
    pub async fn routes(
        &self,
        origin: [f64; 2],
        destination: [f64; 2],
        alternatives: bool,
    ) -> Result<Vec<Route>> {
        // OSRM takes lon,lat pairs
        let url = format!(
            "{}/route/v1/driving/{},{};{},{}?alternatives={}&overview=full&steps=true",
            self.base_url, origin[1], origin[0], destination[1], destination[0], alternatives
        );
        let resp: OsrmResponse = self.http.get(&url).send().await?.json().await?;
        Ok(routes_from_response(resp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Example from the polyline algorithm docs: decodes to
    // (38.5, -120.2), (40.7, -120.95), (43.252, -126.453)
    const SAMPLE_POLYLINE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    #[test]
    fn ok_response_is_converted_to_km_and_minutes() {
        let resp: OsrmResponse = serde_json::from_str(&format!(
            r#"{{"code":"Ok","routes":[{{"geometry":"{SAMPLE_POLYLINE}","distance":25300.0,"duration":1800.0}}]}}"#
        ))
        .unwrap();
        let routes = routes_from_response(resp);
        assert_eq!(routes.len(), 1);
        assert!((routes[0].distance_km - 25.3).abs() < 1e-9);
        assert!((routes[0].duration_min - 30.0).abs() < 1e-9);
        // geometry is (lat, lon)
        assert!((routes[0].geometry[0][0] - 38.5).abs() < 1e-6);
        assert!((routes[0].geometry[0][1] + 120.2).abs() < 1e-6);
    }

    #[test]
    fn display_style_cycles_by_position() {
        let routes_json = (0..4)
            .map(|_| {
                format!(r#"{{"geometry":"{SAMPLE_POLYLINE}","distance":1000.0,"duration":60.0}}"#)
            })
            .join(",");
        let resp: OsrmResponse =
            serde_json::from_str(&format!(r#"{{"code":"Ok","routes":[{routes_json}]}}"#)).unwrap();
        let routes = routes_from_response(resp);
        assert_eq!(routes[0].color, "#1E90FF");
        assert_eq!(routes[0].weight, 5);
        assert_eq!(routes[2].color, "#9932CC");
        assert_eq!(routes[3].color, "#1E90FF");
    }

    #[test]
    fn non_ok_code_yields_empty_candidate_set() {
        let resp: OsrmResponse =
            serde_json::from_str(r#"{"code":"NoRoute","message":"no route found"}"#).unwrap();
        assert!(routes_from_response(resp).is_empty());
    }

    #[test]
    fn undecodable_geometry_is_skipped() {
        let resp: OsrmResponse = serde_json::from_str(
            r#"{"code":"Ok","routes":[{"geometry":"","distance":1000.0,"duration":60.0}]}"#,
        )
        .unwrap();
        assert!(routes_from_response(resp).is_empty());
    }

    #[test]
    fn polyline_length_matches_haversine() {
        // one degree of longitude on the equator is ~111.19 km
        let km = polyline_length_km(&[[0.0, 0.0], [0.0, 1.0]]);
        assert!((110.5..112.0).contains(&km), "got {km}");
    }
}
