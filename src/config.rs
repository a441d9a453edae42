//! Service configuration: bind address, upstream endpoints, timeouts.
//!
//! Values come from an optional TOML file; missing keys fall back to
//! compiled defaults. Port can additionally be overridden on the command
//! line or via environment (see `Args` in main).

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default origin when a request omits one: central Tunis.
pub const DEFAULT_ORIGIN: (f64, f64) = (36.8065, 10.1815);

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interface to bind the API server on
    pub host: String,
    pub port: u16,
    /// OSRM routing service base URL
    pub osrm_url: String,
    /// Nominatim geocoding service base URL
    pub nominatim_url: String,
    /// ISO country codes passed to the geocoder's scoped search
    pub country_codes: String,
    /// Timeout for route lookups, seconds
    pub routing_timeout_secs: u64,
    /// Timeout for geocoding lookups, seconds
    pub geocode_timeout_secs: u64,
    /// Fallback origin [lat, lon] when a request does not supply one
    pub default_origin: [f64; 2],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            osrm_url: "http://router.project-osrm.org".to_string(),
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            country_codes: "tn".to_string(),
            routing_timeout_secs: 30,
            geocode_timeout_secs: 10,
            default_origin: [DEFAULT_ORIGIN.0, DEFAULT_ORIGIN.1],
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, or defaults when `path` is None.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .map_err(|e| Error::Config(format!("cannot read {}: {e}", p.display())))?;
                toml::from_str(&raw)
                    .map_err(|e| Error::Config(format!("cannot parse {}: {e}", p.display())))
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_used_when_no_file_given() {
        let cfg = Config::load(None).unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.country_codes, "tn");
        assert_eq!(cfg.routing_timeout_secs, 30);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg: Config = toml::from_str("port = 8080\ncountry_codes = \"fr\"").unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.country_codes, "fr");
        assert_eq!(cfg.osrm_url, "http://router.project-osrm.org");
        assert_eq!(cfg.default_origin, [36.8065, 10.1815]);
    }
}
