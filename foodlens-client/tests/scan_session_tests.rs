//! Scan session tests: camera event streams driven through the confirmation gate

use async_trait::async_trait;
use foodlens_client::models::{BarcodeLookupOutcome, Locale};
use foodlens_client::scan::{
    BarcodeRead, CameraEvent, GatePhase, ReadBounds, RegionOfInterest, ScanConfirmationGate,
    ScanMode, ScanResolution, ScanSession, SessionEnd,
};
use foodlens_client::services::{map_barcode_to_analyzed_data, BarcodeLookup};
use foodlens_client::{ClientError, ClientResult};
use futures::channel::mpsc;
use futures::stream;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Lookup double: records calls, replays outcomes, optionally blocks until released
struct ScriptedLookup {
    outcomes: Mutex<VecDeque<ClientResult<BarcodeLookupOutcome>>>,
    calls: Mutex<Vec<String>>,
    hold: Option<Semaphore>,
}

impl ScriptedLookup {
    fn new(outcomes: Vec<ClientResult<BarcodeLookupOutcome>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: Mutex::new(Vec::new()),
            hold: None,
        })
    }

    fn held(outcomes: Vec<ClientResult<BarcodeLookupOutcome>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: Mutex::new(Vec::new()),
            hold: Some(Semaphore::new(0)),
        })
    }

    fn release(&self) {
        if let Some(hold) = &self.hold {
            hold.add_permits(1);
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BarcodeLookup for ScriptedLookup {
    async fn lookup(&self, barcode: &str) -> ClientResult<BarcodeLookupOutcome> {
        self.calls.lock().unwrap().push(barcode.to_string());
        if let Some(hold) = &self.hold {
            let _permit = hold.acquire().await;
        }
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(BarcodeLookupOutcome::not_found()))
    }
}

fn found(name: &str) -> ClientResult<BarcodeLookupOutcome> {
    let mut product = map_barcode_to_analyzed_data(json!({ "food_name": name }), Locale::English);
    product.is_barcode = true;
    Ok(BarcodeLookupOutcome::found(product))
}

fn gate() -> ScanConfirmationGate {
    ScanConfirmationGate::new(RegionOfInterest::centered(400.0, 800.0, 280.0), 3)
}

fn read(data: &str) -> CameraEvent {
    CameraEvent::Read(BarcodeRead::new(data, ReadBounds::new(180.0, 380.0, 40.0, 40.0)))
}

fn reads(values: &[&str]) -> Vec<CameraEvent> {
    values.iter().map(|v| read(v)).collect()
}

#[tokio::test]
async fn test_accepts_after_three_consecutive_reads() {
    let lookup = ScriptedLookup::new(vec![found("Cola")]);
    let mut session = ScanSession::new(gate(), Arc::clone(&lookup));

    let end = session.run(stream::iter(reads(&["A", "A", "B", "B", "B"]))).await;

    assert!(matches!(end, SessionEnd::Resolved(ref p) if p.food_name == "Cola" && p.is_barcode));
    assert_eq!(lookup.calls(), vec!["B".to_string()]);
}

#[tokio::test]
async fn test_alternating_reads_never_trigger_lookup() {
    let lookup = ScriptedLookup::new(vec![]);
    let mut session = ScanSession::new(gate(), Arc::clone(&lookup));

    let end = session.run(stream::iter(reads(&["A", "B", "A", "B", "A"]))).await;

    assert_eq!(end, SessionEnd::StreamEnded);
    assert!(lookup.calls().is_empty());
}

#[tokio::test]
async fn test_reads_outside_viewfinder_ignored() {
    let lookup = ScriptedLookup::new(vec![found("Cola")]);
    let mut session = ScanSession::new(gate(), Arc::clone(&lookup));

    let corner = CameraEvent::Read(BarcodeRead::new("A", ReadBounds::new(0.0, 0.0, 30.0, 30.0)));
    let events = vec![read("A"), corner.clone(), corner, read("A")];

    let end = session.run(stream::iter(events)).await;

    assert_eq!(end, SessionEnd::StreamEnded);
    assert!(lookup.calls().is_empty());
    assert_eq!(session.gate().state().consecutive_matches, 2);
}

#[tokio::test(start_paused = true)]
async fn test_reads_dropped_while_lookup_in_flight() {
    let lookup = ScriptedLookup::held(vec![found("Cola")]);
    let mut session = ScanSession::new(gate(), Arc::clone(&lookup));
    let (tx, rx) = mpsc::unbounded();

    let handle = tokio::spawn(async move {
        let end = session.run(rx).await;
        (end, session)
    });

    for _ in 0..3 {
        tx.unbounded_send(read("A")).unwrap();
    }
    for _ in 0..10 {
        tx.unbounded_send(read("A")).unwrap();
    }
    tx.unbounded_send(read("B")).unwrap();

    // Paused clock: the sleep only completes once the session is idle
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(lookup.calls(), vec!["A".to_string()]);

    lookup.release();
    let (end, session) = handle.await.unwrap();

    assert!(matches!(end, SessionEnd::Resolved(_)));
    assert_eq!(lookup.calls().len(), 1);
    assert_eq!(session.gate().phase(), GatePhase::Idle);
}

#[tokio::test]
async fn test_not_found_unlocks_for_next_barcode() {
    let lookup = ScriptedLookup::new(vec![Ok(BarcodeLookupOutcome::not_found()), found("Ramen")]);
    let mut session = ScanSession::new(gate(), Arc::clone(&lookup));

    let end = session
        .run(stream::iter(reads(&["A", "A", "A", "B", "B", "B"])))
        .await;

    assert!(matches!(end, SessionEnd::Resolved(ref p) if p.food_name == "Ramen"));
    assert_eq!(lookup.calls(), vec!["A".to_string(), "B".to_string()]);
    assert_eq!(
        session.not_found(),
        &[ScanResolution::NotFound { barcode: "A".into(), error: None }]
    );
}

#[tokio::test]
async fn test_lookup_failure_unlocks() {
    let lookup = ScriptedLookup::new(vec![Err(ClientError::from_status(404, String::new()))]);
    let mut session = ScanSession::new(gate(), Arc::clone(&lookup));

    let end = session.run(stream::iter(reads(&["A", "A", "A", "C"]))).await;

    assert_eq!(end, SessionEnd::StreamEnded);
    assert_eq!(lookup.calls().len(), 1);
    assert_eq!(session.not_found().len(), 1);
    assert_eq!(session.gate().phase(), GatePhase::Accumulating);
}

#[tokio::test]
async fn test_mode_change_resets_counter() {
    let lookup = ScriptedLookup::new(vec![found("Cola")]);
    let mut session = ScanSession::new(gate(), Arc::clone(&lookup));

    let events = vec![
        read("A"),
        read("A"),
        CameraEvent::ModeChanged(ScanMode::Label),
        read("A"),
        CameraEvent::ModeChanged(ScanMode::Barcode),
        read("A"),
        read("A"),
    ];
    let end = session.run(stream::iter(events)).await;

    assert_eq!(end, SessionEnd::StreamEnded);
    assert!(lookup.calls().is_empty());
    assert_eq!(session.gate().state().consecutive_matches, 2);
}

#[tokio::test(start_paused = true)]
async fn test_lookup_in_flight_when_feed_closes_is_awaited() {
    let lookup = ScriptedLookup::held(vec![found("Cola")]);
    let mut session = ScanSession::new(gate(), Arc::clone(&lookup));

    let releaser = Arc::clone(&lookup);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        releaser.release();
    });

    let end = session.run(stream::iter(reads(&["A", "A", "A"]))).await;
    assert!(matches!(end, SessionEnd::Resolved(_)));
}
