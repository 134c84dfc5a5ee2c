//! Ideal Range Builder
//!
//! Derives the empirical [min, max] of each climate feature per crop label
//! from the training dataset. The resulting table is built once at startup,
//! never mutated, and shared read-only by every request.

use crate::data::{normalize_crop_label, CropDataset, LABEL_COLUMN};
use crate::error::{AdvisorError, Result};
use crate::features::ClimateFeature;
use polars::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Inclusive empirical range of one feature for one crop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdealRange {
    pub min: f64,
    pub max: f64,
}

impl IdealRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Inclusive on both ends
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Zero for crops observed in a single training row
    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// Ideal ranges of the four climate features for one crop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateRanges {
    pub temperature: IdealRange,
    pub rainfall: IdealRange,
    pub humidity: IdealRange,
    pub ph: IdealRange,
}

impl ClimateRanges {
    pub fn get(&self, feature: ClimateFeature) -> IdealRange {
        match feature {
            ClimateFeature::Temperature => self.temperature,
            ClimateFeature::Rainfall => self.rainfall,
            ClimateFeature::Humidity => self.humidity,
            ClimateFeature::Ph => self.ph,
        }
    }
}

/// Crop name (title case) → climate ranges
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CropRangeTable {
    crops: FxHashMap<String, ClimateRanges>,
}

impl CropRangeTable {
    /// Exact lookup by normalised crop name
    pub fn get(&self, crop: &str) -> Option<&ClimateRanges> {
        self.crops.get(crop)
    }

    /// Lookup after trimming and title-casing the name
    pub fn lookup(&self, crop: &str) -> Option<&ClimateRanges> {
        self.crops
            .get(crop)
            .or_else(|| self.crops.get(&normalize_crop_label(crop)))
    }

    /// Crop names, sorted ascending
    pub fn crops(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.crops.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }
}

impl FromIterator<(String, ClimateRanges)> for CropRangeTable {
    /// Keys are normalised; a later duplicate replaces an earlier one
    fn from_iter<I: IntoIterator<Item = (String, ClimateRanges)>>(iter: I) -> Self {
        Self {
            crops: iter
                .into_iter()
                .map(|(crop, ranges)| (normalize_crop_label(&crop), ranges))
                .collect(),
        }
    }
}

fn min_column(feature: ClimateFeature) -> String {
    format!("{}_min", feature.column())
}

fn max_column(feature: ClimateFeature) -> String {
    format!("{}_max", feature.column())
}

/// Build the per-crop ideal range table
///
/// Labels are trimmed and title-cased before grouping, so "rice " and "Rice"
/// share one key. Pure aggregation: min/max do not depend on row order.
///
/// # Errors
/// - `Schema` if `label` or a climate column is missing
/// - `DataIntegrity` if a label is null or a crop has no values for a feature
pub fn build_ideal_ranges(dataset: &CropDataset) -> Result<CropRangeTable> {
    let frame = dataset.normalized_frame(&CropDataset::climate_columns())?;

    let mut aggs: Vec<Expr> = Vec::with_capacity(ClimateFeature::ALL.len() * 2);
    for feature in ClimateFeature::ALL {
        aggs.push(col(feature.column()).min().alias(min_column(feature)));
        aggs.push(col(feature.column()).max().alias(max_column(feature)));
    }

    let grouped = frame
        .lazy()
        .group_by([col(LABEL_COLUMN)])
        .agg(aggs)
        .collect()?;

    let labels = grouped.column(LABEL_COLUMN)?.str()?;
    let value_at = |name: String, row: usize| -> Result<Option<f64>> {
        Ok(grouped.column(&name)?.f64()?.get(row))
    };

    let mut crops = FxHashMap::default();
    for row in 0..grouped.height() {
        let crop = labels
            .get(row)
            .ok_or_else(|| AdvisorError::DataIntegrity(format!("group {} has no crop label", row)))?;

        let range_of = |feature: ClimateFeature| -> Result<IdealRange> {
            match (value_at(min_column(feature), row)?, value_at(max_column(feature), row)?) {
                (Some(min), Some(max)) => Ok(IdealRange::new(min, max)),
                _ => Err(AdvisorError::DataIntegrity(format!(
                    "crop '{}' has no {} values",
                    crop, feature
                ))),
            }
        };

        let ranges = ClimateRanges {
            temperature: range_of(ClimateFeature::Temperature)?,
            rainfall: range_of(ClimateFeature::Rainfall)?,
            humidity: range_of(ClimateFeature::Humidity)?,
            ph: range_of(ClimateFeature::Ph)?,
        };
        crops.insert(crop.to_string(), ranges);
    }

    if crops.is_empty() {
        tracing::warn!("Dataset produced an empty crop range table");
    } else {
        tracing::info!(crops = crops.len(), "Built ideal range table");
    }

    Ok(CropRangeTable { crops })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_dataset() -> CropDataset {
        let df = df! {
            "label" => &["rice", "Rice ", "maize", "rice", "kidneybeans"],
            "temperature" => &[20.0, 26.0, 18.0, 23.5, 19.0],
            "rainfall" => &[220.0, 180.0, 60.0, 200.0, 110.0],
            "humidity" => &[80.0, 75.0, 55.0, 85.0, 21.5],
            "ph" => &[5.5, 7.0, 6.2, 6.0, 5.8]
        }
        .unwrap();
        CropDataset::from_frame(df)
    }

    #[test]
    fn test_min_max_per_crop() {
        let table = build_ideal_ranges(&sample_dataset()).unwrap();
        assert_eq!(table.crops(), ["Kidneybeans", "Maize", "Rice"]);

        let rice = table.get("Rice").unwrap();
        assert_relative_eq!(rice.temperature.min, 20.0);
        assert_relative_eq!(rice.temperature.max, 26.0);
        assert_relative_eq!(rice.rainfall.min, 180.0);
        assert_relative_eq!(rice.rainfall.max, 220.0);
        assert_relative_eq!(rice.humidity.min, 75.0);
        assert_relative_eq!(rice.humidity.max, 85.0);
        assert_relative_eq!(rice.ph.min, 5.5);
        assert_relative_eq!(rice.ph.max, 7.0);
    }

    #[test]
    fn test_single_row_crop_has_zero_width() {
        let table = build_ideal_ranges(&sample_dataset()).unwrap();
        let maize = table.get("Maize").unwrap();
        for feature in ClimateFeature::ALL {
            assert_eq!(maize.get(feature).width(), 0.0);
        }
        assert!(maize.temperature.contains(18.0));
        assert!(!maize.temperature.contains(18.01));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let range = IdealRange::new(20.0, 26.0);
        assert!(range.contains(20.0));
        assert!(range.contains(26.0));
        assert!(!range.contains(19.999));
        assert!(!range.contains(26.001));
    }

    #[test]
    fn test_rebuild_is_identical() {
        let dataset = sample_dataset();
        let first = build_ideal_ranges(&dataset).unwrap();
        let second = build_ideal_ranges(&dataset).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_row_order_does_not_matter() {
        let df = df! {
            "label" => &["kidneybeans", "rice", "maize", "Rice ", "rice"],
            "temperature" => &[19.0, 23.5, 18.0, 26.0, 20.0],
            "rainfall" => &[110.0, 200.0, 60.0, 180.0, 220.0],
            "humidity" => &[21.5, 85.0, 55.0, 75.0, 80.0],
            "ph" => &[5.8, 6.0, 6.2, 7.0, 5.5]
        }
        .unwrap();
        let shuffled = build_ideal_ranges(&CropDataset::from_frame(df)).unwrap();
        assert_eq!(shuffled, build_ideal_ranges(&sample_dataset()).unwrap());
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let df = df! {
            "label" => &["rice"],
            "temperature" => &[25.0],
            "rainfall" => &[200.0],
            "humidity" => &[80.0]
        }
        .unwrap();
        match build_ideal_ranges(&CropDataset::from_frame(df)) {
            Err(AdvisorError::Schema { column }) => assert_eq!(column, "ph"),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_null_value_inside_group_is_skipped() {
        let df = df! {
            "label" => &["rice", "rice", "rice"],
            "temperature" => &[20.0, 26.0, 23.0],
            "rainfall" => &[180.0, 220.0, 200.0],
            "humidity" => &[75.0, 85.0, 80.0],
            "ph" => &[Some(5.5), None, Some(7.0)]
        }
        .unwrap();
        let table = build_ideal_ranges(&CropDataset::from_frame(df)).unwrap();
        let rice = table.get("Rice").unwrap();
        assert_eq!(rice.ph, IdealRange::new(5.5, 7.0));
        assert_eq!(rice.temperature, IdealRange::new(20.0, 26.0));
    }

    #[test]
    fn test_all_null_feature_is_integrity_error() {
        let df = df! {
            "label" => &["rice", "rice"],
            "temperature" => &[25.0, 24.0],
            "rainfall" => &[200.0, 210.0],
            "humidity" => &[80.0, 81.0],
            "ph" => &[None::<f64>, None]
        }
        .unwrap();
        let err = build_ideal_ranges(&CropDataset::from_frame(df)).unwrap_err();
        assert!(matches!(err, AdvisorError::DataIntegrity(msg) if msg.contains("ph")));
    }

    #[test]
    fn test_lookup_normalises_name() {
        let table = build_ideal_ranges(&sample_dataset()).unwrap();
        assert!(table.get("rice").is_none());
        assert!(table.lookup(" rice").is_some());
        assert!(table.lookup("Nonexistent").is_none());
    }
}
