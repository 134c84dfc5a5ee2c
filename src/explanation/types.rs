use crate::error::{AdvisorError, Result};
use crate::explanation::comparator::RangeComparison;
use crate::features::ClimateFeature;
use crate::risk::FeatureWeights;
use serde::ser::{Serialize, Serializer};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Sentinel `why_not` entry for crops absent from the range table
pub const UNAVAILABLE_MESSAGE: &str = "explanation not available";

/// Human-readable justification for one (crop, input) pair
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct Explanation {
    /// Features confirming suitability, in climate-feature order
    pub why: Vec<String>,
    /// Features contradicting suitability, in climate-feature order
    pub why_not: Vec<String>,
}

impl Explanation {
    /// Sentinel for a crop with no range data
    pub fn unavailable() -> Self {
        Self {
            why: Vec::new(),
            why_not: vec![UNAVAILABLE_MESSAGE.to_string()],
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.why.is_empty() && self.why_not.len() == 1 && self.why_not[0] == UNAVAILABLE_MESSAGE
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FeatureDeviation {
    within: bool,
    magnitude: f64,
}

/// Per-feature distance outside the ideal range
///
/// In-range features are recorded with magnitude 0. Magnitudes are never
/// negative. An empty deviation means no range data was available for the
/// crop; scorers treat it as zero risk, which is indistinguishable from a
/// perfect fit.
///
/// Serialises as `{feature: magnitude}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deviation {
    entries: BTreeMap<ClimateFeature, FeatureDeviation>,
}

impl Deviation {
    /// Sentinel for a crop with no range data
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Build from raw magnitudes; zero means in range
    ///
    /// # Errors
    /// `Validation` for a negative or non-finite magnitude.
    pub fn from_magnitudes<I>(magnitudes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (ClimateFeature, f64)>,
    {
        let mut deviation = Self::default();
        for (feature, magnitude) in magnitudes {
            if !magnitude.is_finite() || magnitude < 0.0 {
                return Err(AdvisorError::Validation {
                    field: feature.column().to_string(),
                    reason: format!("a negative or non-finite deviation ({})", magnitude),
                });
            }
            deviation.entries.insert(
                feature,
                FeatureDeviation {
                    within: magnitude == 0.0,
                    magnitude,
                },
            );
        }
        Ok(deviation)
    }

    pub(crate) fn record(&mut self, feature: ClimateFeature, comparison: &RangeComparison) {
        self.entries.insert(
            feature,
            FeatureDeviation {
                within: comparison.is_within_range(),
                magnitude: comparison.distance_from_range,
            },
        );
    }

    pub fn get(&self, feature: ClimateFeature) -> Option<f64> {
        self.entries.get(&feature).map(|d| d.magnitude)
    }

    /// Features and magnitudes, in climate-feature order
    pub fn iter(&self) -> impl Iterator<Item = (ClimateFeature, f64)> + '_ {
        self.entries.iter().map(|(f, d)| (*f, d.magnitude))
    }

    /// Number of features that fell outside their ideal range
    ///
    /// Counts the comparison outcome, so a value just outside a bound still
    /// counts even when its rounded magnitude is 0.
    pub fn out_of_range_count(&self) -> usize {
        self.entries.values().filter(|d| !d.within).count()
    }

    /// Importance-weighted total, as used by the weighted risk scorer
    pub fn total(&self, weights: &FeatureWeights) -> f64 {
        weights.weighted_total(self)
    }

    /// Features that fell outside their ideal range, in climate-feature order
    pub fn out_of_range_features(&self) -> Vec<ClimateFeature> {
        self.entries
            .iter()
            .filter(|(_, d)| !d.within)
            .map(|(f, _)| *f)
            .collect()
    }

    /// Empty: no range data was available
    pub fn is_unavailable(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Deviation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}
