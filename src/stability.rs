//! Explanation Stability Check
//!
//! Perturbs a base input with small uniform noise and measures how much the
//! recommendation and its explanation move:
//! - `top_crop_agreement`: fraction of runs whose first crop matches the base run
//! - `mean_jaccard`: mean Jaccard similarity between the out-of-range feature
//!   sets of the base top crop, base input vs perturbed input
//!
//! Seeded, so a report is reproducible.

use crate::error::{AdvisorError, Result};
use crate::features::{ClimateFeature, UserInput};
use crate::recommender::Recommender;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    pub runs: usize,
    /// Half-width of the uniform perturbation applied to every feature
    pub noise: f64,
    pub seed: u64,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        StabilityConfig {
            runs: 5,
            noise: 0.5,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StabilityReport {
    pub runs: usize,
    pub base_top_crop: String,
    pub top_crop_agreement: f64,
    pub mean_jaccard: f64,
}

/// Run the perturbation experiment around `base`
///
/// # Errors
/// `Config` for zero runs or a negative/non-finite noise level; any error
/// from the recommender for the base or perturbed inputs.
pub fn assess_stability(
    recommender: &Recommender,
    base: &UserInput,
    config: &StabilityConfig,
) -> Result<StabilityReport> {
    if config.runs == 0 {
        return Err(AdvisorError::Config("stability runs must be at least 1".to_string()));
    }
    if !config.noise.is_finite() || config.noise < 0.0 {
        return Err(AdvisorError::Config(format!(
            "stability noise must be finite and non-negative (got {})",
            config.noise
        )));
    }

    let base_ranked = recommender.recommend(base)?;
    let base_top = base_ranked
        .first()
        .map(|entry| entry.crop.clone())
        .ok_or_else(|| AdvisorError::InvalidProbabilities("no recommendation for base input".to_string()))?;
    let base_set = out_of_range_set(recommender, &base_top, base)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let base_vector = base.feature_vector()?;

    let mut agreements = 0usize;
    let mut jaccard_total = 0.0;
    for run in 0..config.runs {
        let mut perturbed = base_vector;
        for value in perturbed.iter_mut() {
            *value += rng.gen_range(-config.noise..=config.noise);
        }
        let input = UserInput::new(perturbed)?;

        let ranked = recommender.recommend(&input)?;
        if ranked.first().map(|e| e.crop.as_str()) == Some(base_top.as_str()) {
            agreements += 1;
        }

        let run_set = out_of_range_set(recommender, &base_top, &input)?;
        let similarity = jaccard(&base_set, &run_set);
        tracing::debug!(run, similarity, "Stability run");
        jaccard_total += similarity;
    }

    let report = StabilityReport {
        runs: config.runs,
        base_top_crop: base_top,
        top_crop_agreement: agreements as f64 / config.runs as f64,
        mean_jaccard: jaccard_total / config.runs as f64,
    };
    tracing::info!(
        agreement = report.top_crop_agreement,
        jaccard = report.mean_jaccard,
        "Stability check complete"
    );
    Ok(report)
}

fn out_of_range_set(
    recommender: &Recommender,
    crop: &str,
    input: &UserInput,
) -> Result<BTreeSet<ClimateFeature>> {
    let assessment = recommender.explain(crop, input)?;
    Ok(assessment.deviation.out_of_range_features().into_iter().collect())
}

/// |A ∩ B| / |A ∪ B|; two empty sets are identical (1.0)
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(b).count() as f64 / union as f64
}
