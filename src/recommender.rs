//! Recommender - process-wide read-only context
//!
//! Holds the range table, the probability model and the scoring strategy.
//! Built once at startup, never mutated afterwards; share it behind an `Arc`
//! and call it from any number of request handlers concurrently.

use crate::config::AdvisorConfig;
use crate::data::{normalize_crop_label, CropDataset};
use crate::error::Result;
use crate::explanation::{explain_crop, Deviation};
use crate::features::UserInput;
use crate::model::{CentroidModel, ProbabilityModel};
use crate::ranges::{build_ideal_ranges, ClimateRanges, CropRangeTable};
use crate::ranker::{rank_with, RecommendationEntry};
use crate::risk::{RiskScoringStrategy, RiskTier};
use anyhow::Context;
use rayon::prelude::*;
use serde::Serialize;

/// Explanation and risk for one crop, outside of ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropAssessment {
    pub crop: String,
    pub why: Vec<String>,
    pub why_not: Vec<String>,
    pub deviation: Deviation,
    pub risk: RiskTier,
}

pub struct Recommender {
    table: CropRangeTable,
    model: Box<dyn ProbabilityModel>,
    strategy: Box<dyn RiskScoringStrategy>,
    top_k: usize,
}

impl Recommender {
    pub fn new(
        table: CropRangeTable,
        model: Box<dyn ProbabilityModel>,
        config: &AdvisorConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            table,
            model,
            strategy: config.strategy(),
            top_k: config.top_k,
        })
    }

    /// Range table and baseline model from an in-memory dataset
    pub fn from_dataset(dataset: &CropDataset, config: &AdvisorConfig) -> Result<Self> {
        let table = build_ideal_ranges(dataset)?;
        let model = CentroidModel::fit(dataset)?;
        Self::new(table, Box::new(model), config)
    }

    /// Load `config.dataset_path` once and build the full context
    pub fn from_config(config: &AdvisorConfig) -> anyhow::Result<Self> {
        tracing::info!("Loading dataset from {}", config.dataset_path.display());
        let dataset = CropDataset::from_csv(&config.dataset_path)?;

        let recommender = Self::from_dataset(&dataset, config)
            .with_context(|| format!("Failed to build recommender from {}", config.dataset_path.display()))?;

        tracing::info!(
            crops = recommender.table.len(),
            strategy = recommender.strategy.name(),
            top_k = recommender.top_k,
            "Recommender ready"
        );
        Ok(recommender)
    }

    pub fn table(&self) -> &CropRangeTable {
        &self.table
    }

    pub fn model(&self) -> &dyn ProbabilityModel {
        self.model.as_ref()
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Ideal ranges of a crop (name is normalised)
    pub fn ranges(&self, crop: &str) -> Option<&ClimateRanges> {
        self.table.lookup(crop)
    }

    /// Top-k crops for one request, safest first
    ///
    /// # Errors
    /// `Validation` if a measurement is missing, `InvalidProbabilities` if
    /// the model output does not line up with its classes.
    pub fn recommend(&self, input: &UserInput) -> Result<Vec<RecommendationEntry>> {
        let features = input.feature_vector()?;
        let probabilities = self.model.predict_proba(&features)?;
        rank_with(
            &probabilities,
            self.model.classes(),
            input,
            &self.table,
            self.strategy.as_ref(),
            self.top_k,
        )
    }

    /// Explain one crop; unknown crops get the sentinel explanation
    pub fn explain(&self, crop: &str, input: &UserInput) -> Result<CropAssessment> {
        let (explanation, deviation) = explain_crop(crop, input, &self.table)?;
        let risk = self.strategy.score(&deviation);
        Ok(CropAssessment {
            crop: normalize_crop_label(crop),
            why: explanation.why,
            why_not: explanation.why_not,
            deviation,
            risk,
        })
    }

    /// Independent requests in parallel; one failure does not affect the others
    pub fn recommend_batch(&self, inputs: &[UserInput]) -> Vec<Result<Vec<RecommendationEntry>>> {
        inputs.par_iter().map(|input| self.recommend(input)).collect()
    }
}
