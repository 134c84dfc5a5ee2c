// Axum API Server Module
//
// Purpose: JSON API over the recommender (ranges + model + risk scoring)
// The recommender is built once at startup and shared read-only across handlers.

#[cfg(feature = "api")]
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};

#[cfg(feature = "api")]
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};

#[cfg(feature = "api")]
use moka::future::Cache;

#[cfg(feature = "api")]
use std::sync::Arc;

#[cfg(feature = "api")]
use std::time::Duration;

#[cfg(feature = "api")]
use std::collections::HashMap;

#[cfg(feature = "api")]
use crate::config::AdvisorConfig;

#[cfg(feature = "api")]
use crate::error::AdvisorError;

#[cfg(feature = "api")]
use crate::features::{ClimateFeature, UserInput};

#[cfg(feature = "api")]
use crate::market::{get_market_data, DataGovFeed, MarketFeed, MarketRecord};

#[cfg(feature = "api")]
use crate::ranker::RecommendationEntry;

#[cfg(feature = "api")]
use crate::recommender::{CropAssessment, Recommender};

// ============================================================================
// Application State
// ============================================================================

#[cfg(feature = "api")]
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    pub config: Arc<AdvisorConfig>,
    pub market_feed: Option<Arc<dyn MarketFeed>>,
    pub market_cache: Cache<String, Arc<Vec<MarketRecord>>>,
}

#[cfg(feature = "api")]
impl AppState {
    /// Load the dataset and build the recommender; the live market feed is
    /// enabled when `MANDI_API_KEY` is set
    pub fn new(config: AdvisorConfig) -> anyhow::Result<Self> {
        tracing::info!("Building recommender...");
        let recommender = Recommender::from_config(&config)?;

        let market_feed = DataGovFeed::from_env().map(|feed| Arc::new(feed) as Arc<dyn MarketFeed>);
        if market_feed.is_none() {
            tracing::info!("MANDI_API_KEY not set, market data served from fallback file");
        }

        Ok(Self::with_recommender(recommender, config, market_feed))
    }

    pub fn with_recommender(
        recommender: Recommender,
        config: AdvisorConfig,
        market_feed: Option<Arc<dyn MarketFeed>>,
    ) -> Self {
        tracing::info!("Initializing Moka cache...");
        let market_cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(Duration::from_secs(300)) // 5 min TTL
            .build();

        Self {
            recommender: Arc::new(recommender),
            config: Arc::new(config),
            market_feed,
            market_cache,
        }
    }
}

// ============================================================================
// Router
// ============================================================================

#[cfg(feature = "api")]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Crop catalogue
        .route("/api/crops", get(list_crops))
        .route("/api/crops/:crop/ranges", get(get_crop_ranges))

        // Recommendation + explanation
        .route("/api/recommend", post(recommend))
        .route("/api/explain", post(explain))

        // Market prices
        .route("/api/market", get(get_market))

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new()) // gzip + brotli compression
        .layer(CorsLayer::permissive()) // Allow all origins (adjust for production)
        .layer(TraceLayer::new_for_http()) // Request logging
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

#[cfg(feature = "api")]
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[cfg(feature = "api")]
async fn list_crops(State(state): State<AppState>) -> Json<serde_json::Value> {
    let crops = state.recommender.table().crops();
    Json(serde_json::json!({
        "rows": crops.len(),
        "data": crops,
    }))
}

#[cfg(feature = "api")]
async fn get_crop_ranges(
    State(state): State<AppState>,
    Path(crop): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let ranges = state
        .recommender
        .ranges(&crop)
        .ok_or_else(|| AppError::NotFound(format!("No ideal ranges for crop '{}'", crop)))?;

    let data: serde_json::Map<String, serde_json::Value> = ClimateFeature::ALL
        .iter()
        .map(|feature| {
            let range = ranges.get(*feature);
            (
                feature.column().to_string(),
                serde_json::json!({ "min": range.min, "max": range.max }),
            )
        })
        .collect();

    Ok(Json(serde_json::json!({
        "crop": crate::data::normalize_crop_label(&crop),
        "ranges": data,
    })))
}

/// Raw field -> number-or-string record, validated into a `UserInput`
#[cfg(feature = "api")]
async fn recommend(
    State(state): State<AppState>,
    Json(raw): Json<HashMap<String, serde_json::Value>>,
) -> Result<Json<Vec<RecommendationEntry>>, AppError> {
    let input = UserInput::try_from(raw)?;
    input.require_all()?;

    // CPU-bound work: run in blocking thread pool
    let recommender = state.recommender.clone();
    let ranked = tokio::task::spawn_blocking(move || recommender.recommend(&input))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

    tracing::debug!(
        top = ranked.first().map(|e| e.crop.as_str()).unwrap_or(""),
        "Recommendation served"
    );
    Ok(Json(ranked))
}

#[cfg(feature = "api")]
#[derive(Debug, serde::Deserialize)]
struct ExplainRequest {
    crop: String,
    input: HashMap<String, serde_json::Value>,
}

#[cfg(feature = "api")]
async fn explain(
    State(state): State<AppState>,
    Json(payload): Json<ExplainRequest>,
) -> Result<Json<CropAssessment>, AppError> {
    let input = UserInput::try_from(payload.input)?;

    let recommender = state.recommender.clone();
    let crop = payload.crop;
    let assessment = tokio::task::spawn_blocking(move || recommender.explain(&crop, &input))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

    Ok(Json(assessment))
}

#[cfg(feature = "api")]
async fn get_market(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let cache_key = "market".to_string();

    if let Some(cached) = state.market_cache.get(&cache_key).await {
        tracing::debug!("Cache hit for market data");
        return Ok(Json(market_json(&cached)));
    }

    // Live feed uses a blocking HTTP client
    let feed = state.market_feed.clone();
    let fallback = state.config.market_fallback_path.clone();
    let limit = state.config.market_limit;
    let records = tokio::task::spawn_blocking(move || {
        get_market_data(feed.as_deref(), &fallback, limit)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
    .map_err(|e| AppError::Internal(format!("Market data error: {:#}", e)))?;

    let records = Arc::new(records);
    state.market_cache.insert(cache_key, records.clone()).await;

    Ok(Json(market_json(&records)))
}

#[cfg(feature = "api")]
fn market_json(records: &[MarketRecord]) -> serde_json::Value {
    serde_json::json!({
        "rows": records.len(),
        "data": records,
    })
}

// ============================================================================
// Error Handling
// ============================================================================

#[cfg(feature = "api")]
#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Internal(String),
    NotFound(String),
}

#[cfg(feature = "api")]
impl From<AdvisorError> for AppError {
    fn from(err: AdvisorError) -> Self {
        if err.is_request_error() {
            AppError::BadRequest(err.to_string())
        } else {
            AppError::Internal(err.to_string())
        }
    }
}

#[cfg(feature = "api")]
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
