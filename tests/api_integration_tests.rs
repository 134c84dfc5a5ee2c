// API Integration Tests
//
// Purpose: Test all API endpoints against an in-memory recommender
// Run with: cargo test --features api --test api_integration_tests

#[cfg(feature = "api")]
mod api_tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use crop_advisor_rust::{
        create_router, AdvisorConfig, AppState, CropDataset, MarketFeed, MarketRecord, Recommender,
    };
    use polars::prelude::*;
    use serde_json::Value;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt; // for oneshot

    struct CountingFeed {
        calls: Arc<AtomicUsize>,
    }

    impl MarketFeed for CountingFeed {
        fn fetch(&self, _limit: usize) -> anyhow::Result<Vec<MarketRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("market API unavailable")
        }
    }

    fn dataset() -> CropDataset {
        let df = df! {
            "N" => &[90.0, 85.0, 60.0, 80.0, 71.0, 20.0, 40.0],
            "P" => &[42.0, 58.0, 55.0, 40.0, 54.0, 67.0, 72.0],
            "K" => &[43.0, 41.0, 44.0, 40.0, 16.0, 20.0, 77.0],
            "temperature" => &[20.0, 26.0, 23.0, 25.0, 22.6, 18.0, 17.0],
            "humidity" => &[82.0, 75.0, 85.0, 80.0, 63.7, 16.0, 18.0],
            "ph" => &[6.5, 7.0, 5.5, 6.2, 5.7, 7.2, 6.8],
            "rainfall" => &[202.0, 180.0, 220.0, 195.0, 87.8, 80.0, 65.0],
            "label" => &["rice", "rice", "rice", "rice", "maize", "chickpea", "chickpea"]
        }
        .unwrap();
        CropDataset::from_frame(df)
    }

    // Helper: Create test app with a fallback market file
    fn create_test_app(
        fallback: &std::path::Path,
        feed: Option<Arc<dyn MarketFeed>>,
    ) -> axum::Router {
        let config = AdvisorConfig {
            market_fallback_path: fallback.to_path_buf(),
            ..AdvisorConfig::default()
        };
        let recommender = Recommender::from_dataset(&dataset(), &config).unwrap();
        create_router(AppState::with_recommender(recommender, config, feed))
    }

    fn fallback_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"state": "Punjab", "district": "Ludhiana", "market": "Khanna", "commodity": "Wheat", "min_price": 2200, "max_price": 2300, "modal_price": 2275, "date": "02/06/2024"}}]"#
        )
        .unwrap();
        file
    }

    // Helper: Parse JSON response
    async fn json_response(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        serde_json::from_slice(&body).expect("Failed to parse JSON")
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    // =========================================================================
    // Section 1: Health Check
    // =========================================================================

    #[tokio::test]
    async fn test_health_check() {
        let fallback = fallback_file();
        let app = create_test_app(fallback.path(), None);

        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = json_response(response).await;
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].is_string());
    }

    // =========================================================================
    // Section 2: Crop catalogue
    // =========================================================================

    #[tokio::test]
    async fn test_list_crops() {
        let fallback = fallback_file();
        let app = create_test_app(fallback.path(), None);

        let response = app.oneshot(get("/api/crops")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_response(response).await;
        assert_eq!(body["rows"], 3);
        assert_eq!(body["data"], serde_json::json!(["Chickpea", "Maize", "Rice"]));
    }

    #[tokio::test]
    async fn test_crop_ranges() {
        let fallback = fallback_file();
        let app = create_test_app(fallback.path(), None);

        let response = app.oneshot(get("/api/crops/rice/ranges")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_response(response).await;
        assert_eq!(body["crop"], "Rice");
        assert_eq!(body["ranges"]["temperature"]["min"], 20.0);
        assert_eq!(body["ranges"]["rainfall"]["max"], 220.0);
    }

    #[tokio::test]
    async fn test_crop_ranges_unknown() {
        let fallback = fallback_file();
        let app = create_test_app(fallback.path(), None);

        let response = app.oneshot(get("/api/crops/mango/ranges")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_response(response).await;
        assert!(body["error"].as_str().unwrap().contains("mango"));
    }

    // =========================================================================
    // Section 3: Recommendation
    // =========================================================================

    #[tokio::test]
    async fn test_recommend() {
        let fallback = fallback_file();
        let app = create_test_app(fallback.path(), None);

        let request = post_json(
            "/api/recommend",
            serde_json::json!({
                "N": 80, "P": "48", "K": 42,
                "temperature": 23.5, "humidity": 80.5, "ph": 6.3, "rainfall": 199
            }),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_response(response).await;
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["crop"], "Rice");
        assert_eq!(entries[0]["risk"], "Low Risk");
        assert_eq!(entries[0]["why"].as_array().unwrap().len(), 4);
        assert_eq!(entries[0]["deviation"]["rainfall"], 0.0);
    }

    #[tokio::test]
    async fn test_recommend_missing_field() {
        let fallback = fallback_file();
        let app = create_test_app(fallback.path(), None);

        let request = post_json(
            "/api/recommend",
            serde_json::json!({
                "N": 80, "P": 48, "K": 42,
                "temperature": 23.5, "humidity": 80.5, "rainfall": 199
            }),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_response(response).await;
        assert_eq!(body["error"], "validation error: field 'ph' is missing");
    }

    #[tokio::test]
    async fn test_recommend_non_numeric_field() {
        let fallback = fallback_file();
        let app = create_test_app(fallback.path(), None);

        let request = post_json(
            "/api/recommend",
            serde_json::json!({
                "N": 80, "P": 48, "K": 42,
                "temperature": "warm", "humidity": 80.5, "ph": 6.3, "rainfall": 199
            }),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_response(response).await;
        assert!(body["error"].as_str().unwrap().contains("'temperature' is not a number"));
    }

    // =========================================================================
    // Section 4: Explanation
    // =========================================================================

    #[tokio::test]
    async fn test_explain() {
        let fallback = fallback_file();
        let app = create_test_app(fallback.path(), None);

        let request = post_json(
            "/api/explain",
            serde_json::json!({
                "crop": "rice",
                "input": {"temperature": 28, "rainfall": 200, "humidity": 80, "ph": 6.5}
            }),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_response(response).await;
        assert_eq!(body["crop"], "Rice");
        assert_eq!(body["why"].as_array().unwrap().len(), 3);
        assert_eq!(body["why_not"][0], "temperature is higher than ideal by 2 (ideal: 20–26)");
        assert_eq!(body["deviation"]["temperature"], 2.0);
        // 2 × 2.0 = 4 → Medium
        assert_eq!(body["risk"], "Medium Risk");
    }

    #[tokio::test]
    async fn test_explain_unknown_crop() {
        let fallback = fallback_file();
        let app = create_test_app(fallback.path(), None);

        let request = post_json(
            "/api/explain",
            serde_json::json!({"crop": "Nonexistent", "input": {}}),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_response(response).await;
        assert_eq!(body["why"], serde_json::json!([]));
        assert_eq!(body["why_not"], serde_json::json!(["explanation not available"]));
        assert_eq!(body["deviation"], serde_json::json!({}));
        assert_eq!(body["risk"], "Low Risk");
    }

    // =========================================================================
    // Section 5: Market
    // =========================================================================

    #[tokio::test]
    async fn test_market_falls_back_and_caches() {
        let fallback = fallback_file();
        let calls = Arc::new(AtomicUsize::new(0));
        let feed: Arc<dyn MarketFeed> = Arc::new(CountingFeed { calls: calls.clone() });
        let app = create_test_app(fallback.path(), Some(feed));

        for _ in 0..2 {
            let response = app.clone().oneshot(get("/api/market")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let body = json_response(response).await;
            assert_eq!(body["rows"], 1);
            assert_eq!(body["data"][0]["commodity"], "Wheat");
            assert_eq!(body["data"][0]["modal_price"], 2275.0);
        }

        // Second request served from cache
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
