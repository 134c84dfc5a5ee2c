//! Recommendation Ranker
//!
//! Picks the classifier's most probable crops, attaches explanation and risk
//! to each, then reorders them so lower-risk crops come first. Within a tier,
//! higher suitability ranks higher. A less probable but safer crop can
//! therefore outrank a more probable, riskier one.

use crate::error::{AdvisorError, Result};
use crate::data::normalize_crop_label;
use crate::explanation::{comparator::round2, explain_crop, Deviation};
use crate::features::UserInput;
use crate::ranges::CropRangeTable;
use crate::risk::{RiskScoringStrategy, RiskTier, Weighted};
use serde::Serialize;
use std::cmp::Ordering;

/// Number of candidates shown to the user
pub const DEFAULT_TOP_K: usize = 3;

/// One ranked crop recommendation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationEntry {
    pub crop: String,
    /// Probability × 100, two decimals
    pub suitability: f64,
    pub why: Vec<String>,
    pub why_not: Vec<String>,
    pub deviation: Deviation,
    pub risk: RiskTier,
}

impl RecommendationEntry {
    /// "87.5%"
    pub fn suitability_display(&self) -> String {
        format!("{}%", self.suitability)
    }
}

/// Indices of the `k` highest probabilities, highest first
///
/// Ties keep the classifier's class order (lower index first).
pub fn top_k_indices(probabilities: &[f64], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..probabilities.len()).collect();
    indices.sort_by(|&a, &b| probabilities[b].total_cmp(&probabilities[a]).then(a.cmp(&b)));
    indices.truncate(k);
    indices
}

/// Risk tier ascending, then suitability descending
pub fn compare_entries(a: &RecommendationEntry, b: &RecommendationEntry) -> Ordering {
    a.risk
        .priority()
        .cmp(&b.risk.priority())
        .then_with(|| b.suitability.total_cmp(&a.suitability))
}

fn validate_probabilities(probabilities: &[f64], classes: &[String], top_k: usize) -> Result<()> {
    if probabilities.len() != classes.len() {
        return Err(AdvisorError::InvalidProbabilities(format!(
            "{} probabilities for {} classes",
            probabilities.len(),
            classes.len()
        )));
    }
    if probabilities.len() < top_k {
        return Err(AdvisorError::InvalidProbabilities(format!(
            "need at least {} classes, got {}",
            top_k,
            probabilities.len()
        )));
    }
    if let Some(index) = probabilities.iter().position(|p| !p.is_finite()) {
        return Err(AdvisorError::InvalidProbabilities(format!(
            "non-finite probability for class '{}'",
            classes[index]
        )));
    }
    Ok(())
}

/// Rank the top-3 crops with weighted risk scoring
pub fn rank_recommendations(
    probabilities: &[f64],
    classes: &[String],
    input: &UserInput,
    table: &CropRangeTable,
) -> Result<Vec<RecommendationEntry>> {
    rank_with(probabilities, classes, input, table, &Weighted::default(), DEFAULT_TOP_K)
}

/// Rank the top-`k` crops with the given scoring strategy
///
/// # Errors
/// - `InvalidProbabilities` if the vector does not match `classes`, is
///   shorter than `top_k`, or holds non-finite values
/// - `Validation` if `input` lacks a climate feature needed by a known crop
pub fn rank_with(
    probabilities: &[f64],
    classes: &[String],
    input: &UserInput,
    table: &CropRangeTable,
    strategy: &dyn RiskScoringStrategy,
    top_k: usize,
) -> Result<Vec<RecommendationEntry>> {
    validate_probabilities(probabilities, classes, top_k)?;

    let mut entries = Vec::with_capacity(top_k);
    for index in top_k_indices(probabilities, top_k) {
        let crop = normalize_crop_label(&classes[index]);
        let suitability = round2(probabilities[index] * 100.0);
        let (explanation, deviation) = explain_crop(&crop, input, table)?;
        let risk = strategy.score(&deviation);

        tracing::debug!(crop = %crop, suitability, risk = %risk, "Scored candidate");

        entries.push(RecommendationEntry {
            crop,
            suitability,
            why: explanation.why,
            why_not: explanation.why_not,
            deviation,
            risk,
        });
    }

    // stable: equal keys keep probability order
    entries.sort_by(compare_entries);
    Ok(entries)
}
