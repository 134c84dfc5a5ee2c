//! Advisor configuration
//!
//! Loaded once at startup from an optional JSON file, then environment
//! overrides are applied (`DATASET_PATH`, `PORT`, `RISK_SCORING`,
//! `MARKET_FALLBACK`). Every field has a default, so an empty file is valid.

use crate::error::{AdvisorError, Result};
use crate::ranker::DEFAULT_TOP_K;
use crate::risk::{FeatureWeights, RiskScoringStrategy, RiskThresholds, ScoringMode};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming a JSON config file
pub const CONFIG_ENV: &str = "ADVISOR_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Training dataset (CSV with N, P, K, temperature, humidity, ph, rainfall, label)
    pub dataset_path: PathBuf,
    pub top_k: usize,
    pub scoring: ScoringMode,
    pub thresholds: RiskThresholds,
    pub weights: FeatureWeights,
    pub market_fallback_path: PathBuf,
    pub market_limit: usize,
    pub port: u16,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        AdvisorConfig {
            dataset_path: PathBuf::from("Crop_recommendation.csv"),
            top_k: DEFAULT_TOP_K,
            scoring: ScoringMode::Weighted,
            thresholds: RiskThresholds::default(),
            weights: FeatureWeights::default(),
            market_fallback_path: PathBuf::from("mandi_data.json"),
            market_limit: 20,
            port: 3000,
        }
    }
}

impl AdvisorConfig {
    /// Load from a JSON file; missing keys keep their defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: AdvisorConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config JSON: {:?}", path))?;

        config.validate()?;
        Ok(config)
    }

    /// Defaults (or `ADVISOR_CONFIG` file) with environment overrides applied
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::load(Path::new(&path))?,
            Err(_) => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("DATASET_PATH") {
            self.dataset_path = PathBuf::from(path);
        }
        if let Some(port) = lookup("PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| AdvisorError::Config(format!("PORT '{}' is not a valid port", port)))?;
        }
        if let Some(mode) = lookup("RISK_SCORING") {
            self.scoring = ScoringMode::parse(&mode).ok_or_else(|| {
                AdvisorError::Config(format!(
                    "RISK_SCORING '{}' must be 'weighted' or 'count'",
                    mode
                ))
            })?;
        }
        if let Some(path) = lookup("MARKET_FALLBACK") {
            self.market_fallback_path = PathBuf::from(path);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(AdvisorError::Config("top_k must be at least 1".to_string()));
        }

        let RiskThresholds { low_max, medium_max } = self.thresholds;
        if !(low_max.is_finite() && medium_max.is_finite()) || low_max < 0.0 || low_max > medium_max {
            return Err(AdvisorError::Config(format!(
                "thresholds must satisfy 0 <= low_max <= medium_max (got {}, {})",
                low_max, medium_max
            )));
        }

        let w = &self.weights;
        for (name, weight) in [
            ("temperature", w.temperature),
            ("rainfall", w.rainfall),
            ("humidity", w.humidity),
            ("ph", w.ph),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(AdvisorError::Config(format!(
                    "weight for {} must be finite and non-negative (got {})",
                    name, weight
                )));
            }
        }

        Ok(())
    }

    /// Scoring strategy selected by `scoring`
    pub fn strategy(&self) -> Box<dyn RiskScoringStrategy> {
        self.scoring.strategy(self.weights, self.thresholds)
    }
}
