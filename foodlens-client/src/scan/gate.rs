//! Scan confirmation gate
//!
//! A live camera decodes the same barcode many times per second and
//! occasionally misreads it. The gate only accepts a value after it was read
//! `required_matches` times in a row inside the viewfinder, and locks while
//! the resulting lookup is in flight.
//!
//! **Phases:** Idle → Accumulating → Locked → Idle

use super::region::{ReadBounds, RegionOfInterest};
use crate::error::ClientResult;
use crate::models::{AnalysisResult, BarcodeLookupOutcome, Locale};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

/// Default number of consecutive identical reads
pub const DEFAULT_REQUIRED_MATCHES: u32 = 3;

/// One decoded barcode from the camera
#[derive(Debug, Clone, PartialEq)]
pub struct BarcodeRead {
    pub data: String,
    /// Absent when the decoder reported no geometry
    pub bounds: Option<ReadBounds>,
}

impl BarcodeRead {
    pub fn new(data: impl Into<String>, bounds: ReadBounds) -> Self {
        Self {
            data: data.into(),
            bounds: Some(bounds),
        }
    }
}

/// Camera mode chosen by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    Food,
    Label,
    Barcode,
}

/// Consecutive-read bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfirmationState {
    pub last_read_value: Option<String>,
    pub consecutive_matches: u32,
    pub required_matches: u32,
}

impl ScanConfirmationState {
    pub fn new(required_matches: u32) -> Self {
        Self {
            last_read_value: None,
            consecutive_matches: 0,
            required_matches: required_matches.max(1),
        }
    }

    pub fn reset(&mut self) {
        self.last_read_value = None;
        self.consecutive_matches = 0;
    }
}

/// Verdict for a single read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanConfidence {
    /// Same value as before, threshold not reached yet
    Wait { matches: u32 },
    /// Threshold reached; counter is back at zero
    Accept,
    /// Different value; counting restarts at one
    Reset,
}

/// Advance `state` with one in-region read
pub fn evaluate_scan_confidence(state: &mut ScanConfirmationState, data: &str) -> ScanConfidence {
    if state.last_read_value.as_deref() == Some(data) {
        let matches = state.consecutive_matches + 1;
        if matches >= state.required_matches {
            state.consecutive_matches = 0;
            ScanConfidence::Accept
        } else {
            state.consecutive_matches = matches;
            ScanConfidence::Wait { matches }
        }
    } else {
        state.last_read_value = Some(data.to_string());
        state.consecutive_matches = 1;
        ScanConfidence::Reset
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    Idle,
    Accumulating,
    /// A lookup for an accepted barcode is in flight
    Locked,
}

impl fmt::Display for GatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatePhase::Idle => write!(f, "idle"),
            GatePhase::Accumulating => write!(f, "accumulating"),
            GatePhase::Locked => write!(f, "locked"),
        }
    }
}

/// What the gate did with a read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Camera is not in barcode mode
    WrongMode,
    /// Missing bounds, or center outside the viewfinder
    OutsideRegion,
    /// A lookup is already in flight
    Locked,
    /// Counted toward confirmation
    Counting { matches: u32 },
    /// Confirmed; start exactly one lookup for this value
    Accepted(String),
}

/// How a lookup for an accepted barcode ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanResolution {
    Resolved(AnalysisResult),
    NotFound {
        barcode: String,
        /// Server message or localized failure text, if any
        error: Option<String>,
    },
}

/// Frame-by-frame barcode confirmation
#[derive(Debug, Clone)]
pub struct ScanConfirmationGate {
    state: ScanConfirmationState,
    roi: RegionOfInterest,
    mode: ScanMode,
    locked_on: Option<String>,
    locale: Locale,
}

impl ScanConfirmationGate {
    pub fn new(roi: RegionOfInterest, required_matches: u32) -> Self {
        Self {
            state: ScanConfirmationState::new(required_matches),
            roi,
            mode: ScanMode::Barcode,
            locked_on: None,
            locale: Locale::English,
        }
    }

    /// Language of the failure text carried by [`ScanResolution::NotFound`]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn phase(&self) -> GatePhase {
        if self.locked_on.is_some() {
            GatePhase::Locked
        } else if self.state.consecutive_matches == 0 && self.state.last_read_value.is_none() {
            GatePhase::Idle
        } else {
            GatePhase::Accumulating
        }
    }

    pub fn state(&self) -> &ScanConfirmationState {
        &self.state
    }

    /// Barcode whose lookup is in flight
    pub fn locked_on(&self) -> Option<&str> {
        self.locked_on.as_deref()
    }

    pub fn on_read(&mut self, read: &BarcodeRead) -> GateDecision {
        if self.mode != ScanMode::Barcode {
            return GateDecision::WrongMode;
        }
        if self.locked_on.is_some() {
            return GateDecision::Locked;
        }

        let in_region = read.bounds.as_ref().is_some_and(|b| self.roi.contains(b));
        if !in_region {
            return GateDecision::OutsideRegion;
        }

        match evaluate_scan_confidence(&mut self.state, &read.data) {
            ScanConfidence::Accept => {
                info!(required = self.state.required_matches, "Barcode confirmed, starting lookup");
                self.locked_on = Some(read.data.clone());
                GateDecision::Accepted(read.data.clone())
            }
            ScanConfidence::Wait { matches } => GateDecision::Counting { matches },
            ScanConfidence::Reset => {
                debug!("New barcode value, restarting confirmation");
                GateDecision::Counting { matches: 1 }
            }
        }
    }

    /// Finish the in-flight lookup and unlock
    pub fn complete_lookup(
        &mut self,
        result: ClientResult<BarcodeLookupOutcome>,
    ) -> ScanResolution {
        let barcode = match self.locked_on.take() {
            Some(barcode) => barcode,
            None => {
                warn!("Lookup completed while the gate was not locked");
                String::new()
            }
        };
        self.state.reset();

        match result {
            Ok(outcome) => {
                let error = outcome.error.clone();
                match outcome.into_product() {
                    Some(product) => ScanResolution::Resolved(product),
                    None => {
                        info!(error = error.as_deref().unwrap_or_default(), "Barcode not found");
                        ScanResolution::NotFound { barcode, error }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Barcode lookup failed");
                ScanResolution::NotFound {
                    barcode,
                    error: Some(e.user_message(self.locale)),
                }
            }
        }
    }

    /// Switch camera mode; leaving barcode mode clears the counters
    pub fn set_mode(&mut self, mode: ScanMode) {
        if self.mode == ScanMode::Barcode && mode != ScanMode::Barcode {
            self.state.reset();
        }
        self.mode = mode;
    }
}
