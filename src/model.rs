//! Probability Model
//!
//! The classifier is an opaque collaborator: anything that maps the seven
//! measurements to a probability per known crop can drive the ranker.
//! `CentroidModel` is a baseline fitted from the same dataset as the range
//! table, so the crate works end to end without an external model.

use crate::data::{CropDataset, LABEL_COLUMN};
use crate::error::{AdvisorError, Result};
use crate::features::Feature;
use polars::prelude::*;

/// Opaque per-class probability function
pub trait ProbabilityModel: Send + Sync {
    /// Class labels, in the order of `predict_proba` output
    fn classes(&self) -> &[String];

    /// One probability per class for a 7-vector (N, P, K, temperature, humidity, ph, rainfall)
    fn predict_proba(&self, features: &[f64; 7]) -> Result<Vec<f64>>;
}

/// Nearest-centroid classifier with softmax probabilities
///
/// Each crop is represented by the mean of its training rows; distances are
/// standardised by the global per-feature standard deviation.
#[derive(Debug, Clone)]
pub struct CentroidModel {
    classes: Vec<String>,
    centroids: Vec<[f64; 7]>,
    scales: [f64; 7],
}

impl CentroidModel {
    /// Fit centroids from the dataset
    ///
    /// Classes are the normalised labels sorted ascending.
    ///
    /// # Errors
    /// `Schema` if `label` or any of the seven feature columns is missing,
    /// `DataIntegrity` if the dataset is empty or a crop has no values for a feature.
    pub fn fit(dataset: &CropDataset) -> Result<Self> {
        let frame = dataset.normalized_frame(&Feature::ALL)?;
        if frame.height() == 0 {
            return Err(AdvisorError::DataIntegrity("dataset has no rows".to_string()));
        }

        let mut scales = [1.0; 7];
        for feature in Feature::ALL {
            let values: Vec<f64> = frame
                .column(feature.column())?
                .f64()?
                .into_iter()
                .flatten()
                .collect();
            scales[feature.index()] = std_dev(&values);
        }

        let grouped = frame
            .lazy()
            .group_by([col(LABEL_COLUMN)])
            .agg(
                Feature::ALL
                    .iter()
                    .map(|f| col(f.column()).mean())
                    .collect::<Vec<_>>(),
            )
            .collect()?;

        let labels = grouped.column(LABEL_COLUMN)?.str()?;
        let mut rows: Vec<(String, [f64; 7])> = Vec::with_capacity(grouped.height());
        for row in 0..grouped.height() {
            let crop = labels
                .get(row)
                .ok_or_else(|| AdvisorError::DataIntegrity(format!("group {} has no crop label", row)))?;

            let mut centroid = [0.0; 7];
            for feature in Feature::ALL {
                centroid[feature.index()] = grouped
                    .column(feature.column())?
                    .f64()?
                    .get(row)
                    .ok_or_else(|| {
                        AdvisorError::DataIntegrity(format!(
                            "crop '{}' has no {} values",
                            crop,
                            feature.column()
                        ))
                    })?;
            }
            rows.push((crop.to_string(), centroid));
        }
        rows.sort_by(|a, b| a.0.cmp(&b.0));

        tracing::info!(classes = rows.len(), "Fitted centroid model");

        let (classes, centroids) = rows.into_iter().unzip();
        Ok(Self {
            classes,
            centroids,
            scales,
        })
    }

    /// Build from explicit centroids; zero or non-finite scales become 1
    pub fn from_centroids(
        centroids: Vec<(String, [f64; 7])>,
        scales: [f64; 7],
    ) -> Result<Self> {
        if centroids.is_empty() {
            return Err(AdvisorError::DataIntegrity("model has no classes".to_string()));
        }
        let scales = scales.map(|s| if s.is_finite() && s > 0.0 { s } else { 1.0 });
        let (classes, centroids) = centroids.into_iter().unzip();
        Ok(Self {
            classes,
            centroids,
            scales,
        })
    }

    /// Centroid of a class, if known
    pub fn centroid(&self, crop: &str) -> Option<&[f64; 7]> {
        self.classes
            .iter()
            .position(|c| c == crop)
            .map(|i| &self.centroids[i])
    }
}

impl ProbabilityModel for CentroidModel {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict_proba(&self, features: &[f64; 7]) -> Result<Vec<f64>> {
        if let Some(i) = features.iter().position(|v| !v.is_finite()) {
            return Err(AdvisorError::not_a_number(Feature::ALL[i].column()));
        }

        let logits: Vec<f64> = self
            .centroids
            .iter()
            .map(|centroid| {
                let distance: f64 = centroid
                    .iter()
                    .zip(features)
                    .zip(&self.scales)
                    .map(|((c, x), s)| ((x - c) / s).powi(2))
                    .sum();
                -0.5 * distance
            })
            .collect();

        Ok(softmax(&logits))
    }
}

/// Population standard deviation; 1 when undefined or zero
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 1.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let sd = var.sqrt();
    if sd.is_finite() && sd > 0.0 {
        sd
    } else {
        1.0
    }
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}
