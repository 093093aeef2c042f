//! # FoodLens Common Library
//!
//! Shared code for the FoodLens crates:
//! - Error and result types
//! - TOML configuration file model and path resolution
//! - Persisted analysis server URL setting

pub mod config;
pub mod error;

pub use error::{Error, Result};
