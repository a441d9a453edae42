//! Free-text destination resolution via Nominatim.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// A resolved place.
#[derive(Debug, Clone)]
pub struct Geocoded {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

pub struct NominatimClient {
    http: reqwest::Client,
    base_url: String,
    country_codes: String,
}

impl NominatimClient {
    pub fn new(base_url: &str, country_codes: &str, timeout: Duration) -> Result<Self> {
        // Nominatim's usage policy requires an identifying User-Agent
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("roadrisk/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            country_codes: country_codes.to_string(),
        })
    }

    /// Resolve a place name, trying the configured country scope first and
    /// retrying unscoped when that finds nothing.
    pub async fn search(&self, query: &str) -> Result<Geocoded> {
        if let Some(place) = self.search_once(query, Some(&self.country_codes)).await? {
            return Ok(place);
        }
        debug!(query, "no scoped geocoding hit, retrying unscoped");
        match self.search_once(query, None).await? {
            Some(place) => Ok(place),
            None => Err(Error::Geocode(format!("no match for '{query}'"))),
        }
    }

    async fn search_once(&self, query: &str, country_codes: Option<&str>) -> Result<Option<Geocoded>> {
        let mut params = vec![
            ("format", "json".to_string()),
            ("limit", "1".to_string()),
            ("q", query.to_string()),
        ];
        if let Some(codes) = country_codes {
            params.push(("countrycodes", codes.to_string()));
        }

        let places: Vec<NominatimPlace> = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&params)
            .send()
            .await?
            .json()
            .await?;

        match places.into_iter().next() {
            Some(place) => {
                let latitude = place
                    .lat
                    .parse::<f64>()
                    .map_err(|e| Error::Geocode(format!("bad latitude in response: {e}")))?;
                let longitude = place
                    .lon
                    .parse::<f64>()
                    .map_err(|e| Error::Geocode(format!("bad longitude in response: {e}")))?;
                Ok(Some(Geocoded {
                    latitude,
                    longitude,
                    display_name: place.display_name,
                }))
            }
            None => Ok(None),
        }
    }
}
