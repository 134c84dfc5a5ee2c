use crate::ranker::RecommendationEntry;
use serde_json;

/// JSON formatter for ranked recommendations
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format recommendations as pretty-printed JSON
    pub fn format(entries: &[RecommendationEntry]) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(entries)
    }

    /// Format recommendations as compact JSON (no whitespace)
    pub fn format_compact(entries: &[RecommendationEntry]) -> Result<String, serde_json::Error> {
        serde_json::to_string(entries)
    }
}
