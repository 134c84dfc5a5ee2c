//! Deviation Analyzer
//!
//! Compares a farmer's climate measurements against a crop's ideal ranges and
//! produces the why / why-not justification plus per-feature deviation.

use crate::error::Result;
use crate::explanation::comparator::{compare_to_range, format_number, RangeComparison, RangeFit};
use crate::explanation::types::{Deviation, Explanation};
use crate::features::{ClimateFeature, UserInput};
use crate::ranges::CropRangeTable;

/// Explain a crop's suitability for the given measurements
///
/// Features are evaluated in the fixed climate order (temperature, rainfall,
/// humidity, ph), so `why` and `why_not` are reproducible.
///
/// A crop absent from the table yields the sentinel explanation and an empty
/// deviation instead of an error.
///
/// # Errors
/// `Validation` naming the first climate feature missing from `input`.
pub fn explain_crop(
    crop: &str,
    input: &UserInput,
    table: &CropRangeTable,
) -> Result<(Explanation, Deviation)> {
    let Some(ranges) = table.lookup(crop) else {
        tracing::debug!(crop, "No ideal ranges for crop");
        return Ok((Explanation::unavailable(), Deviation::unavailable()));
    };

    let mut explanation = Explanation::default();
    let mut deviation = Deviation::default();

    for feature in ClimateFeature::ALL {
        let value = input.climate_value(feature)?;
        let comparison = compare_to_range(value, ranges.get(feature));

        match comparison.fit {
            RangeFit::WithinRange => explanation.why.push(within_message(feature, &comparison)),
            RangeFit::BelowRange | RangeFit::AboveRange => {
                explanation.why_not.push(outside_message(feature, &comparison))
            }
        }
        deviation.record(feature, &comparison);
    }

    Ok((explanation, deviation))
}

/// "temperature is within ideal range (value: 25, ideal: 20–26)"
fn within_message(feature: ClimateFeature, comparison: &RangeComparison) -> String {
    format!(
        "{} is {} (value: {}, {})",
        feature,
        comparison.fit.display_text(),
        format_number(comparison.value),
        comparison.ideal_text()
    )
}

/// "rainfall is lower than ideal by 12.5 (ideal: 180–220)"
fn outside_message(feature: ClimateFeature, comparison: &RangeComparison) -> String {
    format!(
        "{} is {} by {} ({})",
        feature,
        comparison.fit.display_text(),
        format_number(comparison.distance_from_range),
        comparison.ideal_text()
    )
}
