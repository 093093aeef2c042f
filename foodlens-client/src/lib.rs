//! foodlens-client library interface
//!
//! Turns a food photo or a scanned barcode into a validated, normalized
//! food-safety result from the remote analysis server.

pub mod config;
pub mod error;
pub mod models;
pub mod scan;
pub mod services;
pub mod utils;
pub mod validators;

pub use crate::config::ClientConfig;
pub use crate::error::{ClientError, ClientResult};
pub use crate::services::FoodAnalyzer;

/// Build identification logged at startup
pub fn build_info() -> String {
    format!(
        "v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    )
}
