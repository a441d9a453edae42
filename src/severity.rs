//! Accident-severity prediction.
//!
//! Thin numeric adapter over an external classification model: packs a
//! fixed-order feature vector, runs inference, and maps the argmax of the
//! model output onto a categorical label. Model failures never cross this
//! boundary; they degrade to `SeverityLabel::Unknown` with a note the
//! caller can display.

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::weather::WeatherCategory;

/// Severity class predicted for the prevailing conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeverityLabel {
    Medium,
    High,
    Critical,
    Unknown,
}

impl SeverityLabel {
    /// Maps the model's argmax index onto a label. Indices outside the
    /// trained classes degrade to `Unknown`.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => SeverityLabel::Medium,
            1 => SeverityLabel::High,
            2 => SeverityLabel::Critical,
            other => {
                warn!(index = other, "severity index outside known classes");
                SeverityLabel::Unknown
            }
        }
    }

    /// Lenient parse for labels arriving as strings over the API.
    pub fn parse(label: &str) -> Self {
        match label {
            "Medium" => SeverityLabel::Medium,
            "High" => SeverityLabel::High,
            "Critical" => SeverityLabel::Critical,
            other => {
                warn!(label = other, "unrecognized severity label");
                SeverityLabel::Unknown
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeverityLabel::Medium => "Medium",
            SeverityLabel::High => "High",
            SeverityLabel::Critical => "Critical",
            SeverityLabel::Unknown => "Unknown",
        }
    }

    /// Advisory sentence shown (and spoken) to the driver.
    pub fn advice(self) -> &'static str {
        match self {
            SeverityLabel::Medium => {
                "Normal driving conditions. Exercise standard caution."
            }
            SeverityLabel::High => {
                "Hazardous conditions detected. Drive with increased caution and reduce your speed."
            }
            SeverityLabel::Critical => {
                "Extremely dangerous conditions. Consider postponing your trip if possible."
            }
            SeverityLabel::Unknown => "Unable to determine the risk level.",
        }
    }
}

/// Number of features the severity model was trained on.
pub const FEATURE_COUNT: usize = 8;

// Placeholder values for features the app has no live source for,
// matching what the model saw at training time.
const CASUALTY_PLACEHOLDER: f32 = 3.0;
const VEHICLE_PLACEHOLDER: f32 = 100.0;
const ROAD_SURFACE_PLACEHOLDER: f32 = 2.0;

/// External inference backend. Output is one logit/probability per
/// severity class; the adapter takes the argmax.
pub trait SeverityModel: Send + Sync {
    fn run(&self, features: &[f32; FEATURE_COUNT]) -> anyhow::Result<Vec<f32>>;
}

/// Packs the model's fixed-order feature vector:
/// day-of-week (Mon=0), ordinal date, latitude, longitude, casualty and
/// vehicle placeholders, road-surface placeholder, weather class ordinal.
pub fn feature_vector(
    category: WeatherCategory,
    latitude: f64,
    longitude: f64,
    day_of_week: u32,
    ordinal_date: i32,
) -> [f32; FEATURE_COUNT] {
    [
        day_of_week as f32,
        ordinal_date as f32,
        latitude as f32,
        longitude as f32,
        CASUALTY_PLACEHOLDER,
        VEHICLE_PLACEHOLDER,
        ROAD_SURFACE_PLACEHOLDER,
        category.ordinal() as f32,
    ]
}

/// Prediction outcome handed back to the API layer. `note` carries the
/// recoverable failure message when the model could not be consulted.
#[derive(Debug, Clone, Serialize)]
pub struct SeverityAssessment {
    pub label: SeverityLabel,
    pub note: Option<String>,
}

pub struct SeverityPredictor {
    model: Box<dyn SeverityModel>,
}

impl SeverityPredictor {
    pub fn new(model: Box<dyn SeverityModel>) -> Self {
        Self { model }
    }

    /// Predict severity for the given weather and location, using the
    /// current wall-clock date and weekday as calendar features.
    pub fn predict(&self, category: WeatherCategory, latitude: f64, longitude: f64) -> SeverityAssessment {
        let now = Local::now();
        self.predict_at(
            category,
            latitude,
            longitude,
            now.weekday().num_days_from_monday(),
            now.date_naive().num_days_from_ce(),
        )
    }

    /// Calendar-explicit variant; `predict` supplies wall-clock values.
    pub fn predict_at(
        &self,
        category: WeatherCategory,
        latitude: f64,
        longitude: f64,
        day_of_week: u32,
        ordinal_date: i32,
    ) -> SeverityAssessment {
        if !latitude.is_finite() || !longitude.is_finite() {
            warn!(latitude, longitude, "non-finite coordinates passed to severity predictor");
            return SeverityAssessment {
                label: SeverityLabel::Unknown,
                note: Some("invalid coordinates for severity prediction".to_string()),
            };
        }

        let features = feature_vector(category, latitude, longitude, day_of_week, ordinal_date);
        match self.model.run(&features) {
            Ok(output) => match argmax(&output) {
                Some(index) => SeverityAssessment {
                    label: SeverityLabel::from_index(index),
                    note: None,
                },
                None => {
                    warn!("severity model returned empty output");
                    SeverityAssessment {
                        label: SeverityLabel::Unknown,
                        note: Some("severity model returned no output".to_string()),
                    }
                }
            },
            Err(e) => {
                warn!(error = %e, "severity inference failed");
                SeverityAssessment {
                    label: SeverityLabel::Unknown,
                    note: Some(format!("severity prediction unavailable: {e}")),
                }
            }
        }
    }
}

/// First occurrence wins on ties, matching numpy's argmax.
fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &value) in values.iter().enumerate() {
        let better = match best {
            Some((_, best_value)) => value > best_value,
            None => true,
        };
        if better {
            best = Some((index, value));
        }
    }
    best.map(|(index, _)| index)
}

/// Stand-in logits keyed on the weather feature, used until a trained
/// model backend is wired in.
pub struct BaselineModel;

impl SeverityModel for BaselineModel {
    fn run(&self, features: &[f32; FEATURE_COUNT]) -> anyhow::Result<Vec<f32>> {
        // MOCK DATA: adverse weather skews toward the higher classes.
        let logits = match features[7] as u32 {
            1 => [0.1, 0.3, 0.6], // Foggy
            2 => [0.2, 0.5, 0.3], // Rainy
            0 => [0.5, 0.4, 0.1], // Cloudy
            _ => [0.7, 0.2, 0.1],
        };
        Ok(logits.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedModel(Vec<f32>);
    impl SeverityModel for FixedModel {
        fn run(&self, _features: &[f32; FEATURE_COUNT]) -> anyhow::Result<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    struct FailingModel;
    impl SeverityModel for FailingModel {
        fn run(&self, _features: &[f32; FEATURE_COUNT]) -> anyhow::Result<Vec<f32>> {
            anyhow::bail!("model file not found")
        }
    }

    #[test]
    fn feature_vector_order_is_fixed() {
        let v = feature_vector(WeatherCategory::Rainy, 36.8, 10.1, 2, 739_000);
        assert_eq!(v[0], 2.0);
        assert_eq!(v[1], 739_000.0);
        assert!((v[2] - 36.8).abs() < 1e-4);
        assert!((v[3] - 10.1).abs() < 1e-4);
        assert_eq!(&v[4..7], &[3.0f32, 100.0, 2.0][..]);
        assert_eq!(v[7], 2.0);
    }

    #[test]
    fn argmax_index_maps_to_label() {
        let predictor = SeverityPredictor::new(Box::new(FixedModel(vec![0.1, 0.2, 0.7])));
        let out = predictor.predict_at(WeatherCategory::Foggy, 36.8, 10.1, 0, 739_000);
        assert_eq!(out.label, SeverityLabel::Critical);
        assert!(out.note.is_none());
    }

    #[test]
    fn tied_logits_resolve_to_the_first_class() {
        // numpy's argmax keeps the first of equal maxima; a tie must not
        // escalate to the more severe class
        let predictor = SeverityPredictor::new(Box::new(FixedModel(vec![0.5, 0.5, 0.0])));
        let out = predictor.predict_at(WeatherCategory::Cloudy, 36.8, 10.1, 0, 739_000);
        assert_eq!(out.label, SeverityLabel::Medium);

        let predictor = SeverityPredictor::new(Box::new(FixedModel(vec![0.2, 0.4, 0.4])));
        let out = predictor.predict_at(WeatherCategory::Cloudy, 36.8, 10.1, 0, 739_000);
        assert_eq!(out.label, SeverityLabel::High);
    }

    #[test]
    fn index_outside_trained_classes_degrades_to_unknown() {
        // four outputs, argmax lands on index 3
        let predictor = SeverityPredictor::new(Box::new(FixedModel(vec![0.1, 0.1, 0.1, 0.9])));
        let out = predictor.predict_at(WeatherCategory::Shine, 36.8, 10.1, 0, 739_000);
        assert_eq!(out.label, SeverityLabel::Unknown);
    }

    #[test]
    fn inference_failure_degrades_to_unknown_with_note() {
        let predictor = SeverityPredictor::new(Box::new(FailingModel));
        let out = predictor.predict_at(WeatherCategory::Rainy, 36.8, 10.1, 4, 739_000);
        assert_eq!(out.label, SeverityLabel::Unknown);
        assert!(out.note.unwrap().contains("model file not found"));
    }

    #[test]
    fn empty_model_output_degrades_to_unknown() {
        let predictor = SeverityPredictor::new(Box::new(FixedModel(vec![])));
        let out = predictor.predict_at(WeatherCategory::Cloudy, 36.8, 10.1, 1, 739_000);
        assert_eq!(out.label, SeverityLabel::Unknown);
        assert!(out.note.is_some());
    }

    #[test]
    fn non_finite_coordinates_are_rejected_softly() {
        let predictor = SeverityPredictor::new(Box::new(BaselineModel));
        let out = predictor.predict(WeatherCategory::Shine, f64::NAN, 10.1);
        assert_eq!(out.label, SeverityLabel::Unknown);
    }

    #[test]
    fn baseline_model_ranks_fog_as_critical() {
        let predictor = SeverityPredictor::new(Box::new(BaselineModel));
        let out = predictor.predict_at(WeatherCategory::Foggy, 36.8, 10.1, 0, 739_000);
        assert_eq!(out.label, SeverityLabel::Critical);
    }

    #[test]
    fn unrecognized_severity_string_parses_to_unknown() {
        assert_eq!(SeverityLabel::parse("Catastrophic"), SeverityLabel::Unknown);
        assert_eq!(SeverityLabel::parse("High"), SeverityLabel::High);
    }
}
