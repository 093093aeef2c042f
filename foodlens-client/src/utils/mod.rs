//! Utility modules for foodlens-client

pub mod retry;

pub use retry::{retry_with_backoff, with_timeout, RetryPolicy};
