//! Barcode lookup outcome

use super::AnalysisResult;
use serde::{Deserialize, Serialize};

/// Result of a barcode lookup
///
/// `found == true` without `data` means the server recognized the code but
/// sent nothing usable; callers treat it like "not found".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarcodeLookupOutcome {
    pub found: bool,
    pub data: Option<AnalysisResult>,
    pub error: Option<String>,
}

impl BarcodeLookupOutcome {
    pub fn found(data: AnalysisResult) -> Self {
        Self {
            found: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            found: false,
            data: None,
            error: None,
        }
    }

    /// Failure folded into a "not found" outcome with a message
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            found: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Product data when the lookup actually produced something usable
    pub fn product(&self) -> Option<&AnalysisResult> {
        if self.found {
            self.data.as_ref()
        } else {
            None
        }
    }

    pub fn into_product(self) -> Option<AnalysisResult> {
        if self.found {
            self.data
        } else {
            None
        }
    }
}
