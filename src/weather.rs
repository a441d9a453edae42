//! Weather classification vocabulary.
//!
//! The image classifier itself is an external collaborator; this module
//! only fixes the label set it emits and the ordinal encoding shared with
//! the severity model.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Weather category emitted by the upstream image classifier.
///
/// Ordinals 0..=4 are the classifier's output classes; anything outside
/// that range degrades to `Unknown` rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherCategory {
    Cloudy,
    Foggy,
    Rainy,
    Shine,
    Sunrise,
    Unknown,
}

impl WeatherCategory {
    pub fn from_ordinal(ordinal: u32) -> Self {
        match ordinal {
            0 => WeatherCategory::Cloudy,
            1 => WeatherCategory::Foggy,
            2 => WeatherCategory::Rainy,
            3 => WeatherCategory::Shine,
            4 => WeatherCategory::Sunrise,
            other => {
                warn!(ordinal = other, "weather ordinal outside known classes");
                WeatherCategory::Unknown
            }
        }
    }

    /// Ordinal fed to the severity model's feature vector. `Unknown` has no
    /// class of its own upstream; it reuses the catch-all slot 5.
    pub fn ordinal(self) -> u32 {
        match self {
            WeatherCategory::Cloudy => 0,
            WeatherCategory::Foggy => 1,
            WeatherCategory::Rainy => 2,
            WeatherCategory::Shine => 3,
            WeatherCategory::Sunrise => 4,
            WeatherCategory::Unknown => 5,
        }
    }

    /// Lenient parse for labels arriving as strings over the API. Labels
    /// outside the enum are logged and degrade to `Unknown`.
    pub fn parse(label: &str) -> Self {
        match label {
            "Cloudy" => WeatherCategory::Cloudy,
            "Foggy" => WeatherCategory::Foggy,
            "Rainy" => WeatherCategory::Rainy,
            "Shine" => WeatherCategory::Shine,
            "Sunrise" => WeatherCategory::Sunrise,
            other => {
                warn!(label = other, "unrecognized weather label");
                WeatherCategory::Unknown
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WeatherCategory::Cloudy => "Cloudy",
            WeatherCategory::Foggy => "Foggy",
            WeatherCategory::Rainy => "Rainy",
            WeatherCategory::Shine => "Shine",
            WeatherCategory::Sunrise => "Sunrise",
            WeatherCategory::Unknown => "Unknown",
        }
    }
}

/// One weather reading for an image batch. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherObservation {
    pub category: WeatherCategory,
    /// Classifier confidence, percent in [0, 100]
    pub confidence: f64,
}

impl WeatherObservation {
    pub fn new(category: WeatherCategory, confidence: f64) -> Self {
        Self {
            category,
            confidence: confidence.clamp(0.0, 100.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_mapping_round_trips_known_classes() {
        for ordinal in 0..5 {
            assert_eq!(WeatherCategory::from_ordinal(ordinal).ordinal(), ordinal);
        }
    }

    #[test]
    fn out_of_range_ordinal_degrades_to_unknown() {
        assert_eq!(WeatherCategory::from_ordinal(9), WeatherCategory::Unknown);
    }

    #[test]
    fn unrecognized_label_degrades_to_unknown() {
        assert_eq!(WeatherCategory::parse("Stormy"), WeatherCategory::Unknown);
        assert_eq!(WeatherCategory::parse("Foggy"), WeatherCategory::Foggy);
    }

    #[test]
    fn confidence_is_clamped_to_percent_range() {
        assert_eq!(WeatherObservation::new(WeatherCategory::Shine, 120.0).confidence, 100.0);
        assert_eq!(WeatherObservation::new(WeatherCategory::Shine, -3.0).confidence, 0.0);
    }
}
