//! Test Helper Utilities
//!
//! Shared utilities for testing foodlens-client

#![allow(dead_code)]

pub mod log_capture;
pub mod stub_server;

use foodlens_client::models::AllergyProfile;
use foodlens_client::services::{InMemoryResultCache, ReqwestTransport, StaticProfileSource};
use foodlens_client::{ClientConfig, FoodAnalyzer};
use std::sync::Arc;
use std::time::Duration;

pub use log_capture::{LogCapture, LogRecord};
pub use stub_server::{RecordedRequest, StubServer};

/// Config pointing at `server_url` with millisecond backoff
pub fn fast_config(server_url: &str) -> ClientConfig {
    let mut config = ClientConfig {
        server_url: server_url.to_string(),
        locale_tag: "en-US".to_string(),
        ..ClientConfig::default()
    };
    config.upload.base_delay = Duration::from_millis(5);
    config.lookup.base_delay = Duration::from_millis(5);
    config
}

/// Analyzer over the real reqwest transport, with a cache the test can inspect
pub fn analyzer_for(
    server_url: &str,
    allergies: &[&str],
) -> (FoodAnalyzer, Arc<InMemoryResultCache>) {
    let cache = Arc::new(InMemoryResultCache::new());
    let profile = StaticProfileSource::new(AllergyProfile::new(
        allergies.iter().map(|a| a.to_string()).collect(),
        vec![],
    ));
    let analyzer = FoodAnalyzer::with_parts(
        fast_config(server_url),
        Arc::new(profile),
        Arc::new(ReqwestTransport::new().unwrap()),
        cache.clone(),
    );
    (analyzer, cache)
}

pub const KIMBAP_RESPONSE: &str = r#"{
    "foodName": "Kimbap",
    "safetyStatus": "CAUTION",
    "confidence": 87,
    "ingredients": ["rice", {"name": "sesame oil", "isAllergen": true, "riskReason": "Sesame"}],
    "raw_result": "Contains sesame."
}"#;

pub const COLA_LOOKUP_RESPONSE: &str = r#"{
    "found": true,
    "data": {
        "food_name": "Cola Zero",
        "calories": 0,
        "ingredients": ["carbonated water", "caramel color"]
    }
}"#;

pub const NOT_FOUND_RESPONSE: &str =
    r#"{"found": false, "message": "Product not found in any database"}"#;
