//! Risk Scorer
//!
//! Aggregates a crop's per-feature deviation into a discrete risk tier.
//!
//! Two strategies sit behind `RiskScoringStrategy`:
//! - `Weighted`: importance-weighted sum of magnitudes against tunable thresholds
//! - `CountBased`: number of out-of-range features (0 → Low, 1 → Medium, ≥2 → High)
//!
//! Both treat an empty deviation (no range data) as Low risk.

use crate::explanation::comparator::round2;
use crate::explanation::Deviation;
use crate::features::ClimateFeature;
use serde::{Deserialize, Serialize};

/// Agronomic risk of growing a recommended crop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskTier {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Medium Risk")]
    Medium,
    #[serde(rename = "High Risk")]
    High,
}

impl RiskTier {
    /// Sort priority (lower ranks first)
    pub fn priority(&self) -> u8 {
        match self {
            RiskTier::Low => 0,
            RiskTier::Medium => 1,
            RiskTier::High => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low Risk",
            RiskTier::Medium => "Medium Risk",
            RiskTier::High => "High Risk",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Importance weight per climate feature
///
/// Every climate feature has an explicit weight; there is no fallback for
/// unlisted features because a deviation can only hold climate features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureWeights {
    pub temperature: f64,
    pub rainfall: f64,
    pub humidity: f64,
    pub ph: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        FeatureWeights {
            temperature: 2.0,
            rainfall: 2.0,
            humidity: 1.5,
            ph: 1.5,
        }
    }
}

impl FeatureWeights {
    pub fn weight(&self, feature: ClimateFeature) -> f64 {
        match feature {
            ClimateFeature::Temperature => self.temperature,
            ClimateFeature::Rainfall => self.rainfall,
            ClimateFeature::Humidity => self.humidity,
            ClimateFeature::Ph => self.ph,
        }
    }

    /// Σ weight × magnitude, rounded to 2 decimals; 0 for an empty deviation
    ///
    /// Magnitudes carry two decimals, so the rounded sum is the exact total
    /// and lands on a threshold instead of just above it.
    pub fn weighted_total(&self, deviation: &Deviation) -> f64 {
        let total: f64 = deviation
            .iter()
            .map(|(feature, magnitude)| self.weight(feature) * magnitude)
            .sum();
        round2(total)
    }
}

/// Tier boundaries for the weighted total
///
/// total ≤ low_max → Low; total ≤ medium_max → Medium; otherwise High.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub low_max: f64,
    pub medium_max: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        RiskThresholds {
            low_max: 3.0,
            medium_max: 8.0,
        }
    }
}

impl RiskThresholds {
    pub fn classify(&self, total: f64) -> RiskTier {
        if total <= self.low_max {
            RiskTier::Low
        } else if total <= self.medium_max {
            RiskTier::Medium
        } else {
            RiskTier::High
        }
    }
}

/// Strategy turning a deviation into a risk tier
pub trait RiskScoringStrategy: Send + Sync {
    fn score(&self, deviation: &Deviation) -> RiskTier;

    fn name(&self) -> &'static str;
}

/// Importance-weighted magnitude sum
#[derive(Debug, Clone, Copy, Default)]
pub struct Weighted {
    pub weights: FeatureWeights,
    pub thresholds: RiskThresholds,
}

impl Weighted {
    pub fn new(weights: FeatureWeights, thresholds: RiskThresholds) -> Self {
        Self { weights, thresholds }
    }
}

impl RiskScoringStrategy for Weighted {
    fn score(&self, deviation: &Deviation) -> RiskTier {
        self.thresholds.classify(self.weights.weighted_total(deviation))
    }

    fn name(&self) -> &'static str {
        "weighted"
    }
}

/// Out-of-range feature count
#[derive(Debug, Clone, Copy, Default)]
pub struct CountBased;

impl RiskScoringStrategy for CountBased {
    fn score(&self, deviation: &Deviation) -> RiskTier {
        calculate_risk_from_count(deviation.out_of_range_count())
    }

    fn name(&self) -> &'static str {
        "count"
    }
}

/// Strategy selector used by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    #[default]
    Weighted,
    Count,
}

impl ScoringMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "weighted" => Some(ScoringMode::Weighted),
            "count" | "simple" => Some(ScoringMode::Count),
            _ => None,
        }
    }

    pub fn strategy(
        &self,
        weights: FeatureWeights,
        thresholds: RiskThresholds,
    ) -> Box<dyn RiskScoringStrategy> {
        match self {
            ScoringMode::Weighted => Box::new(Weighted::new(weights, thresholds)),
            ScoringMode::Count => Box::new(CountBased),
        }
    }
}

/// Weighted risk with the default weights and thresholds
pub fn calculate_risk(deviation: &Deviation) -> RiskTier {
    Weighted::default().score(deviation)
}

/// Count-based risk: 0 → Low, 1 → Medium, ≥2 → High
pub fn calculate_risk_from_count(out_of_range: usize) -> RiskTier {
    match out_of_range {
        0 => RiskTier::Low,
        1 => RiskTier::Medium,
        _ => RiskTier::High,
    }
}
