//! Error types for foodlens-client
//!
//! Four kinds of failure reach callers:
//! - contract violations (malformed server payload, never retried)
//! - rejected requests (4xx other than 429, never retried)
//! - transient faults (429, 5xx, network, timeout; retried, then surfaced)
//! - local faults (cancellation, configuration, bad input)
//!
//! Missing or wrong-typed optional fields are not errors at all; the
//! normalizer resolves them to defaults.

use crate::models::Locale;
use std::time::Duration;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// Server payload failed boundary validation
    #[error("[AI Contract] {endpoint}: {detail}")]
    Contract { endpoint: String, detail: String },

    /// Client/request error reported by the server (4xx except 429)
    #[error("Server rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// Retryable HTTP status (429, 5xx, anything else unexpected)
    #[error("Server returned status {status}")]
    Status { status: u16 },

    /// Connection-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// Attempt lost the race against its timer
    #[error("Operation timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    /// Final upload attempt timed out; the server is probably waking from idle
    #[error("{endpoint} timed out ({timeout_secs}s). The server might be cold starting.")]
    ColdStart { endpoint: String, timeout_secs: u64 },

    /// Caller cancelled the operation
    #[error("Request cancelled")]
    Cancelled,

    /// Response body was not valid JSON
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// foodlens-common error
    #[error("Common error: {0}")]
    Common(#[from] foodlens_common::Error),
}

impl ClientError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, body: String) -> Self {
        if (400..500).contains(&status) && status != 429 {
            ClientError::Rejected { status, body }
        } else {
            ClientError::Status { status }
        }
    }

    /// Transient faults worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Status { .. } | ClientError::Network(_) | ClientError::Timeout(_)
        )
    }

    /// Localized text suitable for an end-user alert
    pub fn user_message(&self, locale: Locale) -> String {
        match (self, locale) {
            (ClientError::ColdStart { timeout_secs, .. }, Locale::Korean) => format!(
                "분석 시간이 초과되었습니다 ({}초). 서버가 대기 상태에서 깨어나는 중일 수 있습니다. 잠시 후 다시 시도해주세요.",
                timeout_secs
            ),
            (ClientError::ColdStart { timeout_secs, .. }, Locale::English) => format!(
                "Analysis timed out ({}s). The server might be waking up from idle, please try again in a moment.",
                timeout_secs
            ),
            (ClientError::Timeout(_), Locale::Korean) => {
                "요청 시간이 초과되었습니다. 다시 시도해주세요.".to_string()
            }
            (ClientError::Timeout(_), Locale::English) => {
                "The request timed out. Please try again.".to_string()
            }
            (ClientError::Cancelled, Locale::Korean) => "요청이 취소되었습니다.".to_string(),
            (ClientError::Cancelled, Locale::English) => "Request cancelled.".to_string(),
            (ClientError::Rejected { status, .. }, Locale::Korean) => {
                format!("서버가 요청을 처리할 수 없습니다 ({}).", status)
            }
            (ClientError::Rejected { status, .. }, Locale::English) => {
                format!("The server could not process this request ({}).", status)
            }
            (_, Locale::Korean) => "문제가 발생했습니다. 다시 시도해주세요.".to_string(),
            (_, Locale::English) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ClientError::from_status(404, "nope".into()),
            ClientError::Rejected { status: 404, .. }
        ));
        assert!(matches!(
            ClientError::from_status(429, String::new()),
            ClientError::Status { status: 429 }
        ));
        assert!(matches!(
            ClientError::from_status(503, String::new()),
            ClientError::Status { status: 503 }
        ));
    }

    #[test]
    fn test_retryable_taxonomy() {
        assert!(ClientError::Status { status: 500 }.is_retryable());
        assert!(ClientError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(ClientError::Network("reset".into()).is_retryable());
        assert!(!ClientError::Rejected { status: 400, body: String::new() }.is_retryable());
        assert!(!ClientError::Contract {
            endpoint: "/analyze".into(),
            detail: "x".into()
        }
        .is_retryable());
        assert!(!ClientError::Cancelled.is_retryable());
    }

    #[test]
    fn test_rejected_message_embeds_status() {
        let err = ClientError::from_status(404, "not here".into());
        assert!(err.to_string().contains("404"));
        assert!(err.user_message(Locale::English).contains("404"));
    }

    #[test]
    fn test_timeout_user_message() {
        let err = ClientError::Timeout(Duration::from_secs(15));
        assert!(err.user_message(Locale::English).contains("timed out"));
        assert_eq!(err.to_string(), "Operation timed out after 15000 ms");
    }
}
