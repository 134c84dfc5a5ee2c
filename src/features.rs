//! Feature definitions and per-request user input
//!
//! The classifier consumes all seven measurements; the explainer only ever
//! looks at the four climate features.

use crate::error::{AdvisorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Classifier input features, in model column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    Nitrogen,
    Phosphorus,
    Potassium,
    Temperature,
    Humidity,
    Ph,
    Rainfall,
}

impl Feature {
    pub const ALL: [Feature; 7] = [
        Feature::Nitrogen,
        Feature::Phosphorus,
        Feature::Potassium,
        Feature::Temperature,
        Feature::Humidity,
        Feature::Ph,
        Feature::Rainfall,
    ];

    /// Dataset column / request field name
    pub fn column(&self) -> &'static str {
        match self {
            Feature::Nitrogen => "N",
            Feature::Phosphorus => "P",
            Feature::Potassium => "K",
            Feature::Temperature => "temperature",
            Feature::Humidity => "humidity",
            Feature::Ph => "ph",
            Feature::Rainfall => "rainfall",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Case-insensitive lookup by field name
    pub fn from_name(name: &str) -> Option<Feature> {
        let name = name.trim();
        Feature::ALL
            .iter()
            .copied()
            .find(|f| f.column().eq_ignore_ascii_case(name))
    }

    pub fn climate(&self) -> Option<ClimateFeature> {
        match self {
            Feature::Temperature => Some(ClimateFeature::Temperature),
            Feature::Rainfall => Some(ClimateFeature::Rainfall),
            Feature::Humidity => Some(ClimateFeature::Humidity),
            Feature::Ph => Some(ClimateFeature::Ph),
            Feature::Nitrogen | Feature::Phosphorus | Feature::Potassium => None,
        }
    }
}

/// Climate subset evaluated by the range-based explainer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClimateFeature {
    Temperature,
    Rainfall,
    Humidity,
    Ph,
}

impl ClimateFeature {
    /// Fixed evaluation order; explanation sequences follow it
    pub const ALL: [ClimateFeature; 4] = [
        ClimateFeature::Temperature,
        ClimateFeature::Rainfall,
        ClimateFeature::Humidity,
        ClimateFeature::Ph,
    ];

    pub fn feature(&self) -> Feature {
        match self {
            ClimateFeature::Temperature => Feature::Temperature,
            ClimateFeature::Rainfall => Feature::Rainfall,
            ClimateFeature::Humidity => Feature::Humidity,
            ClimateFeature::Ph => Feature::Ph,
        }
    }

    pub fn column(&self) -> &'static str {
        self.feature().column()
    }
}

impl std::fmt::Display for ClimateFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// Measurements supplied with one request
///
/// Lives for the duration of the request. Values are always finite.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "HashMap<String, serde_json::Value>")]
pub struct UserInput {
    values: [Option<f64>; 7],
}

impl UserInput {
    /// All seven measurements, in model order
    pub fn new(values: [f64; 7]) -> Result<Self> {
        let mut input = UserInput::default();
        for (feature, value) in Feature::ALL.iter().zip(values) {
            input.set(*feature, value)?;
        }
        Ok(input)
    }

    /// Climate-only input, enough for the explainer
    pub fn climate(temperature: f64, rainfall: f64, humidity: f64, ph: f64) -> Result<Self> {
        let mut input = UserInput::default();
        input.set(Feature::Temperature, temperature)?;
        input.set(Feature::Rainfall, rainfall)?;
        input.set(Feature::Humidity, humidity)?;
        input.set(Feature::Ph, ph)?;
        Ok(input)
    }

    /// Parse a raw form record; all seven fields are required
    pub fn from_raw(raw: &HashMap<String, String>) -> Result<Self> {
        let mut input = UserInput::default();
        for (key, text) in raw {
            if let Some(feature) = Feature::from_name(key) {
                let value: f64 = text
                    .trim()
                    .parse()
                    .map_err(|_| AdvisorError::not_a_number(feature.column()))?;
                input.set(feature, value)?;
            }
        }
        input.require_all()?;
        Ok(input)
    }

    pub fn set(&mut self, feature: Feature, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(AdvisorError::not_a_number(feature.column()));
        }
        self.values[feature.index()] = Some(value);
        Ok(())
    }

    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.values[feature.index()]
    }

    /// Value of a climate feature, failing fast when absent
    pub fn climate_value(&self, feature: ClimateFeature) -> Result<f64> {
        self.get(feature.feature())
            .ok_or_else(|| AdvisorError::missing(feature.column()))
    }

    /// Error naming the first missing feature, in model order
    pub fn require_all(&self) -> Result<()> {
        self.feature_vector().map(|_| ())
    }

    /// Model input vector (N, P, K, temperature, humidity, ph, rainfall)
    pub fn feature_vector(&self) -> Result<[f64; 7]> {
        let mut out = [0.0; 7];
        for feature in Feature::ALL {
            out[feature.index()] = self
                .get(feature)
                .ok_or_else(|| AdvisorError::missing(feature.column()))?;
        }
        Ok(out)
    }
}

impl TryFrom<HashMap<String, serde_json::Value>> for UserInput {
    type Error = AdvisorError;

    /// Lenient: known fields are parsed (numbers or numeric strings), unknown
    /// keys are ignored, missing fields are left unset.
    fn try_from(raw: HashMap<String, serde_json::Value>) -> Result<Self> {
        let mut input = UserInput::default();
        for (key, value) in raw {
            let Some(feature) = Feature::from_name(&key) else {
                continue;
            };
            let number = match &value {
                serde_json::Value::Number(n) => n.as_f64(),
                serde_json::Value::String(s) => s.trim().parse().ok(),
                _ => None,
            };
            let number = number.ok_or_else(|| AdvisorError::not_a_number(feature.column()))?;
            input.set(feature, number)?;
        }
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_feature_order_matches_model_columns() {
        let cols: Vec<&str> = Feature::ALL.iter().map(|f| f.column()).collect();
        assert_eq!(cols, ["N", "P", "K", "temperature", "humidity", "ph", "rainfall"]);
        assert_eq!(Feature::Rainfall.index(), 6);
    }

    #[test]
    fn test_climate_subset_order() {
        let cols: Vec<&str> = ClimateFeature::ALL.iter().map(|f| f.column()).collect();
        assert_eq!(cols, ["temperature", "rainfall", "humidity", "ph"]);
        assert_eq!(Feature::Nitrogen.climate(), None);
        assert_eq!(Feature::Ph.climate(), Some(ClimateFeature::Ph));
    }

    #[test]
    fn test_from_raw_complete() {
        let input = UserInput::from_raw(&raw(&[
            ("N", "90"),
            ("P", "42"),
            ("K", "43"),
            ("temperature", "20.8"),
            ("humidity", "82"),
            ("PH", " 6.5 "),
            ("rainfall", "202"),
        ]))
        .unwrap();
        assert_eq!(
            input.feature_vector().unwrap(),
            [90.0, 42.0, 43.0, 20.8, 82.0, 6.5, 202.0]
        );
    }

    #[test]
    fn test_from_raw_missing_field() {
        let err = UserInput::from_raw(&raw(&[
            ("N", "90"),
            ("P", "42"),
            ("K", "43"),
            ("temperature", "20.8"),
            ("humidity", "82"),
            ("rainfall", "202"),
        ]))
        .unwrap_err();
        match err {
            AdvisorError::Validation { field, reason } => {
                assert_eq!(field, "ph");
                assert_eq!(reason, "missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_raw_non_numeric() {
        let err = UserInput::from_raw(&raw(&[("N", "lots")])).unwrap_err();
        assert!(err.to_string().contains("'N' is not a number"));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(UserInput::climate(f64::NAN, 200.0, 80.0, 6.5).is_err());
        assert!(UserInput::climate(25.0, f64::INFINITY, 80.0, 6.5).is_err());
    }

    #[test]
    fn test_deserialize_accepts_numbers_and_strings() {
        let input: UserInput = serde_json::from_str(
            r#"{"temperature": 25, "rainfall": "200", "humidity": 80.0, "ph": 6.5, "crop": "x"}"#,
        )
        .unwrap();
        assert_eq!(input.climate_value(ClimateFeature::Rainfall).unwrap(), 200.0);
        assert!(input.get(Feature::Nitrogen).is_none());
        assert!(input.feature_vector().is_err());
    }

    #[test]
    fn test_deserialize_rejects_non_numeric() {
        let result: std::result::Result<UserInput, _> =
            serde_json::from_str(r#"{"humidity": true}"#);
        assert!(result.is_err());
    }
}
