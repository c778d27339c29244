//! Integration tests for the ingestion coordinator
//!
//! Drives the coordinator through a scripted transport channel and asserts
//! on the exact event sequence seen by a subscriber plus the store contents.

use tempfile::TempDir;
use tokio::sync::{broadcast, mpsc};

use xrplog_common::classify::ClassifyError;
use xrplog_common::db::{init_database, RecordStore};
use xrplog_common::events::{EventBus, LedgerEvent};
use xrplog_common::records::RecordKind;
use xrplog_mon::coordinator::Coordinator;
use xrplog_mon::transport::TransportEvent;

const INFO_FRAME: &str = r#"{"result":{"account_data":{
    "Account":"rLNaPoKeeBjZe2qs6x52yVPZpZ8td4dc6w",
    "Balance":"13000000",
    "Sequence":"2"
}}}"#;

const STATE_FRAME: &str = r#"{"result":{"state":{
    "load_base":256,
    "load_factor":512,
    "peers":12,
    "validated_ledger":{"base_fee":10}
}}}"#;

async fn open_store(dir: &TempDir) -> RecordStore {
    let pool = init_database(&dir.path().join("xrplog.db"))
        .await
        .expect("database initialization failed");

    RecordStore::new(pool)
}

/// Feed the scripted events through a coordinator and collect everything a
/// subscriber saw, in delivery order.
async fn run_pipeline(store: RecordStore, script: Vec<TransportEvent>) -> Vec<LedgerEvent> {
    let bus = EventBus::new(64);
    let mut rx = bus.subscribe();

    let (tx, transport_rx) = mpsc::channel(16);
    for event in script {
        tx.send(event).await.unwrap();
    }
    drop(tx);

    Coordinator::new(bus, store).run(transport_rx).await;

    let mut seen = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => seen.push(event),
            Err(broadcast::error::TryRecvError::Empty) => break,
            Err(e) => panic!("subscriber lost events: {e}"),
        }
    }
    seen
}

#[tokio::test]
async fn frames_produce_one_notification_each_in_receive_order() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    let events = run_pipeline(
        store.clone(),
        vec![
            TransportEvent::Frame(INFO_FRAME.to_string()),
            TransportEvent::Frame("not json {{{".to_string()),
            TransportEvent::Frame(STATE_FRAME.to_string()),
        ],
    )
    .await;

    // Ignoring persistence confirmations, the classification outcomes are
    // exactly: record(Info), error(MalformedPayload), record(State).
    let outcomes: Vec<&LedgerEvent> = events
        .iter()
        .filter(|e| !matches!(e, LedgerEvent::RecordPersisted { .. }))
        .collect();

    assert_eq!(outcomes.len(), 3, "unexpected events: {events:?}");
    assert!(matches!(
        outcomes[0],
        LedgerEvent::RecordClassified {
            record,
            ..
        } if matches!(record.kind, RecordKind::Info { .. })
    ));
    assert!(matches!(
        outcomes[1],
        LedgerEvent::ClassificationFailed {
            error: ClassifyError::MalformedPayload,
            ..
        }
    ));
    assert!(matches!(
        outcomes[2],
        LedgerEvent::RecordClassified {
            record,
            ..
        } if matches!(record.kind, RecordKind::State { .. })
    ));
}

#[tokio::test]
async fn classified_records_are_persisted_in_receive_order() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    let events = run_pipeline(
        store.clone(),
        vec![
            TransportEvent::Frame(INFO_FRAME.to_string()),
            TransportEvent::Frame("not json {{{".to_string()),
            TransportEvent::Frame(STATE_FRAME.to_string()),
        ],
    )
    .await;

    // One persistence confirmation per classified record, ids increasing
    let ids: Vec<i64> = events
        .iter()
        .filter_map(|e| match e {
            LedgerEvent::RecordPersisted { id, .. } => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids[1] > ids[0]);

    // Newest first: the State record arrived last
    let stored = store.list_ordered_by_created_at_desc().await.unwrap();
    assert_eq!(stored.len(), 2);
    assert!(matches!(stored[0].record.kind, RecordKind::State { .. }));
    assert!(matches!(stored[1].record.kind, RecordKind::Info { .. }));
}

#[tokio::test]
async fn server_reported_error_is_surfaced_verbatim() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    let events = run_pipeline(
        store.clone(),
        vec![TransportEvent::Frame(
            r#"{"error_message":"Account not found."}"#.to_string(),
        )],
    )
    .await;

    assert_eq!(events.len(), 1);
    match &events[0] {
        LedgerEvent::ClassificationFailed {
            error: ClassifyError::ServerReported(message),
            ..
        } => assert_eq!(message, "Account not found."),
        other => panic!("expected ClassificationFailed, got {other:?}"),
    }

    // Errors carry no partial record and nothing reaches the store
    assert!(store
        .list_ordered_by_created_at_desc()
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn lifecycle_events_are_forwarded_verbatim() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    let events = run_pipeline(
        store,
        vec![
            TransportEvent::Opened,
            TransportEvent::Frame(INFO_FRAME.to_string()),
            TransportEvent::Closed {
                reason: "going away".to_string(),
            },
        ],
    )
    .await;

    assert!(matches!(events[0], LedgerEvent::ConnectionOpened { .. }));
    match events.last().unwrap() {
        LedgerEvent::ConnectionClosed { reason, .. } => assert_eq!(reason, "going away"),
        other => panic!("expected ConnectionClosed, got {other:?}"),
    }
}

#[tokio::test]
async fn transport_failure_is_forwarded_and_distinct() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    let events = run_pipeline(
        store,
        vec![TransportEvent::Failed {
            message: "connection reset".to_string(),
        }],
    )
    .await;

    assert_eq!(events.len(), 1);
    match &events[0] {
        LedgerEvent::ConnectionError { message, .. } => assert_eq!(message, "connection reset"),
        other => panic!("expected ConnectionError, got {other:?}"),
    }
}
