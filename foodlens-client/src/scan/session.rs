//! Scan session: drives the confirmation gate over a live camera feed
//!
//! Camera events and the in-flight lookup are multiplexed on a single task.
//! Reads that arrive while a lookup runs still reach the gate, which drops
//! them, so each accepted barcode produces exactly one lookup.

use super::gate::{BarcodeRead, GateDecision, ScanConfirmationGate, ScanMode, ScanResolution};
use crate::error::ClientResult;
use crate::models::{AnalysisResult, BarcodeLookupOutcome};
use crate::services::lookup_transport::{mask_barcode, BarcodeLookup};
use futures::future::BoxFuture;
use futures::{FutureExt, Stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, info};

/// Input from the camera layer
#[derive(Debug, Clone, PartialEq)]
pub enum CameraEvent {
    Read(BarcodeRead),
    ModeChanged(ScanMode),
}

/// Why [`ScanSession::run`] returned
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEnd {
    /// A product was found; the caller navigates to the result
    Resolved(AnalysisResult),
    /// The camera feed closed
    StreamEnded,
}

type LookupFuture = BoxFuture<'static, ClientResult<BarcodeLookupOutcome>>;

/// Resolves once the in-flight lookup finishes; never resolves when there is none
async fn next_lookup_result(
    in_flight: &mut Option<LookupFuture>,
) -> ClientResult<BarcodeLookupOutcome> {
    match in_flight {
        Some(lookup) => lookup.await,
        None => std::future::pending().await,
    }
}

pub struct ScanSession<L: BarcodeLookup + ?Sized> {
    gate: ScanConfirmationGate,
    lookup: Arc<L>,
    not_found: Vec<ScanResolution>,
}

impl<L: BarcodeLookup + ?Sized + 'static> ScanSession<L> {
    pub fn new(gate: ScanConfirmationGate, lookup: Arc<L>) -> Self {
        Self {
            gate,
            lookup,
            not_found: Vec::new(),
        }
    }

    pub fn gate(&self) -> &ScanConfirmationGate {
        &self.gate
    }

    /// Lookups that ended without a product, oldest first
    pub fn not_found(&self) -> &[ScanResolution] {
        &self.not_found
    }

    fn start_lookup(&self, barcode: String) -> LookupFuture {
        let lookup = Arc::clone(&self.lookup);
        async move { lookup.lookup(&barcode).await }.boxed()
    }

    /// Consume camera events until a product resolves or the feed ends
    ///
    /// A lookup still in flight when the feed ends is awaited first.
    pub async fn run<S>(&mut self, events: S) -> SessionEnd
    where
        S: Stream<Item = CameraEvent> + Unpin,
    {
        let mut events = events;
        let mut in_flight: Option<LookupFuture> = None;
        let mut feed_open = true;

        loop {
            if !feed_open && in_flight.is_none() {
                info!(not_found = self.not_found.len(), "Camera feed closed, ending scan session");
                return SessionEnd::StreamEnded;
            }

            tokio::select! {
                biased;

                result = next_lookup_result(&mut in_flight), if in_flight.is_some() => {
                    in_flight = None;
                    match self.gate.complete_lookup(result) {
                        ScanResolution::Resolved(product) => {
                            info!(food_name = %product.food_name, "Scan resolved");
                            return SessionEnd::Resolved(product);
                        }
                        not_found => self.not_found.push(not_found),
                    }
                }

                event = events.next(), if feed_open => match event {
                    None => feed_open = false,
                    Some(CameraEvent::ModeChanged(mode)) => {
                        debug!(?mode, "Camera mode changed");
                        self.gate.set_mode(mode);
                    }
                    Some(CameraEvent::Read(read)) => {
                        if let GateDecision::Accepted(barcode) = self.gate.on_read(&read) {
                            debug!(
                                barcode = %mask_barcode(&barcode),
                                "Starting lookup for confirmed barcode"
                            );
                            in_flight = Some(self.start_lookup(barcode));
                        }
                    }
                },
            }
        }
    }
}
