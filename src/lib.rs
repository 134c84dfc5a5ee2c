//! Crop Advisor Rust Implementation
//!
//! Recommends crops for a field from soil/climate measurements and explains
//! each recommendation with per-feature ideal ranges and a risk tier.
//!
//! - `data/`, `ranges/`: dataset loading with Polars and the per-crop range table
//! - `explanation/`: why / why-not analysis against ideal ranges
//! - `risk/`, `ranker/`: risk tiers and the safety-first ordering of candidates
//! - `recommender/`: the read-only context shared by every request

pub mod error;
pub mod features;
pub mod data;
pub mod ranges;
pub mod explanation;
pub mod risk;
pub mod ranker;
pub mod model;
pub mod config;
pub mod recommender;
pub mod stability;
pub mod market;

// Phase: API server (feature-gated)
#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use error::{AdvisorError, Result};
pub use features::{ClimateFeature, Feature, UserInput};
pub use data::{normalize_crop_label, CropDataset};
pub use ranges::{build_ideal_ranges, ClimateRanges, CropRangeTable, IdealRange};
pub use explanation::{explain_crop, Deviation, Explanation, JsonFormatter, MarkdownFormatter};
pub use risk::{
    calculate_risk, calculate_risk_from_count, CountBased, FeatureWeights, RiskScoringStrategy,
    RiskThresholds, RiskTier, ScoringMode, Weighted,
};
pub use ranker::{rank_recommendations, rank_with, RecommendationEntry};
pub use model::{CentroidModel, ProbabilityModel};
pub use config::AdvisorConfig;
pub use recommender::{CropAssessment, Recommender};
pub use stability::{assess_stability, StabilityConfig, StabilityReport};
pub use market::{get_market_data, MarketFeed, MarketRecord};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
