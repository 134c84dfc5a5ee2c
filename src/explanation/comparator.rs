//! Range Comparator
//!
//! Core logic for comparing a measured value against a crop's inclusive
//! ideal range [min, max].

use crate::ranges::IdealRange;

/// Result of comparing a measured value to a crop's ideal range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeFit {
    /// value < min
    BelowRange,

    /// min <= value <= max
    WithinRange,

    /// value > max
    AboveRange,
}

impl RangeFit {
    pub fn display_text(&self) -> &'static str {
        match self {
            RangeFit::BelowRange => "lower than ideal",
            RangeFit::WithinRange => "within ideal range",
            RangeFit::AboveRange => "higher than ideal",
        }
    }
}

/// Result of range comparison with distance
#[derive(Debug, Clone, Copy)]
pub struct RangeComparison {
    pub fit: RangeFit,

    pub value: f64,

    pub range: IdealRange,

    /// Distance from the nearest bound, rounded to 2 decimals (0 if within range)
    pub distance_from_range: f64,
}

impl RangeComparison {
    pub fn is_within_range(&self) -> bool {
        self.fit == RangeFit::WithinRange
    }

    /// "ideal: 20–26"
    pub fn ideal_text(&self) -> String {
        format!(
            "ideal: {}–{}",
            format_number(self.range.min),
            format_number(self.range.max)
        )
    }
}

/// Compare a measured value against an ideal range
///
/// Both bounds are inclusive. Distance is never negative.
pub fn compare_to_range(value: f64, range: IdealRange) -> RangeComparison {
    let (fit, distance) = if value < range.min {
        (RangeFit::BelowRange, round2(range.min - value))
    } else if value > range.max {
        (RangeFit::AboveRange, round2(value - range.max))
    } else {
        (RangeFit::WithinRange, 0.0)
    };

    RangeComparison {
        fit,
        value,
        range,
        distance_from_range: distance,
    }
}

/// Round to 2 decimals, ties to even (0.125 -> 0.12, 0.375 -> 0.38)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Two-decimal display without trailing zeros: 25.0 -> "25", 12.5 -> "12.5"
pub fn format_number(value: f64) -> String {
    let rounded = round2(value);
    // normalise -0
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{}", rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_range() {
        let comp = compare_to_range(25.0, IdealRange::new(20.0, 26.0));
        assert_eq!(comp.fit, RangeFit::WithinRange);
        assert_eq!(comp.distance_from_range, 0.0);
        assert!(comp.is_within_range());
    }

    #[test]
    fn test_bounds_are_within() {
        let range = IdealRange::new(20.0, 26.0);
        assert!(compare_to_range(20.0, range).is_within_range());
        assert!(compare_to_range(26.0, range).is_within_range());
    }

    #[test]
    fn test_below_range() {
        let comp = compare_to_range(170.0, IdealRange::new(180.0, 220.0));
        assert_eq!(comp.fit, RangeFit::BelowRange);
        assert_eq!(comp.distance_from_range, 10.0);
    }

    #[test]
    fn test_above_range_rounds_distance() {
        let comp = compare_to_range(7.123, IdealRange::new(5.5, 7.0));
        assert_eq!(comp.fit, RangeFit::AboveRange);
        assert_eq!(comp.distance_from_range, 0.12);
    }

    #[test]
    fn test_round2_ties_to_even() {
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(2.5), 2.5);
        assert_eq!(round2(1.006), 1.01);

        let comp = compare_to_range(6.125, IdealRange::new(5.5, 6.0));
        assert_eq!(comp.distance_from_range, 0.12);
    }

    #[test]
    fn test_zero_width_range() {
        let range = IdealRange::new(6.5, 6.5);
        assert!(compare_to_range(6.5, range).is_within_range());
        assert_eq!(compare_to_range(6.0, range).fit, RangeFit::BelowRange);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(25.0), "25");
        assert_eq!(format_number(12.5), "12.5");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(202.9356), "202.94");
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn test_ideal_text() {
        let comp = compare_to_range(25.0, IdealRange::new(20.0, 26.84));
        assert_eq!(comp.ideal_text(), "ideal: 20–26.84");
    }
}
