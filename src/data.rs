//! Dataset Loading
//!
//! Loads the crop recommendation CSV (seven measurements + `label`) with Polars.
//! The dataset is read once at startup and consumed read-only afterwards.

use crate::error::{AdvisorError, Result};
use crate::features::{ClimateFeature, Feature};
use anyhow::Context;
use polars::prelude::*;
use std::path::Path;

/// Name of the categorical crop column
pub const LABEL_COLUMN: &str = "label";

/// Tabular training dataset
#[derive(Debug, Clone)]
pub struct CropDataset {
    frame: DataFrame,
}

impl CropDataset {
    /// Load dataset from a CSV file with header
    pub fn from_csv(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.into()))
            .with_context(|| format!("Failed to create CSV reader: {}", path.display()))?
            .finish()
            .with_context(|| format!("Failed to load crop dataset: {}", path.display()))?;

        tracing::info!(
            rows = frame.height(),
            columns = frame.width(),
            "Loaded crop dataset from {}",
            path.display()
        );

        Ok(Self { frame })
    }

    pub fn from_frame(frame: DataFrame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Fail with `Schema` naming the first required column that is absent
    pub fn validate_columns(&self, required: &[&str]) -> Result<()> {
        let names = self.frame.get_column_names();
        for &expected in required {
            if !names.iter().any(|name| name.as_str() == expected) {
                return Err(AdvisorError::Schema {
                    column: expected.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Normalised crop label per row
    ///
    /// Null labels are a data integrity failure naming the row.
    pub fn labels(&self) -> Result<Vec<String>> {
        self.validate_columns(&[LABEL_COLUMN])?;
        let column = self.frame.column(LABEL_COLUMN)?;
        let labels = column.str().map_err(|_| {
            AdvisorError::DataIntegrity(format!("column '{}' is not a string column", LABEL_COLUMN))
        })?;

        labels
            .into_iter()
            .enumerate()
            .map(|(row, label)| {
                label
                    .map(normalize_crop_label)
                    .ok_or_else(|| AdvisorError::DataIntegrity(format!("row {} has no crop label", row)))
            })
            .collect()
    }

    /// Frame with the normalised label column and the requested features cast to Float64
    pub fn normalized_frame(&self, features: &[Feature]) -> Result<DataFrame> {
        let mut required: Vec<&str> = vec![LABEL_COLUMN];
        required.extend(features.iter().map(|f| f.column()));
        self.validate_columns(&required)?;

        let labels = Series::new(LABEL_COLUMN.into(), self.labels()?);
        let mut frame = self.frame.clone();
        frame.with_column(labels)?;

        let mut exprs = vec![col(LABEL_COLUMN)];
        exprs.extend(
            features
                .iter()
                .map(|f| col(f.column()).cast(DataType::Float64)),
        );

        Ok(frame.lazy().select(exprs).collect()?)
    }

    /// Climate columns required by the range builder
    pub fn climate_columns() -> Vec<Feature> {
        ClimateFeature::ALL.iter().map(|f| f.feature()).collect()
    }
}

/// Trim whitespace and title-case: "rice " -> "Rice", "pigeon peas" -> "Pigeon Peas"
///
/// Every run of alphabetic characters starts upper-case, the rest is lower-cased.
pub fn normalize_crop_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut prev_alpha = false;
    for ch in label.trim().chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}
