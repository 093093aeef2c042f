//! Live barcode scanning: viewfinder geometry, confirmation gate and session loop

pub mod gate;
pub mod region;
pub mod session;

pub use gate::{
    evaluate_scan_confidence, BarcodeRead, GateDecision, GatePhase, ScanConfidence,
    ScanConfirmationGate, ScanConfirmationState, ScanMode, ScanResolution,
    DEFAULT_REQUIRED_MATCHES,
};
pub use region::{ReadBounds, RegionOfInterest, DEFAULT_ROI_SIDE};
pub use session::{CameraEvent, ScanSession, SessionEnd};
