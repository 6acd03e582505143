//! Integration tests for the stockscan-core message contract.
//!
//! These exercise the public API the way both bridges use it: decode transport
//! text, validate, route through a registry, and encode replies.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use parking_lot::Mutex;
use serde_json::json;
use stockscan_core::{
    decode_text, encode, protocol::is_valid, validate, BridgeError, Dispatch, HandlerRegistry,
    Message, MessageType, RfidErrorPayload, RfidScanResult, ScannerStatus, ValidationError,
};

#[test]
fn test_every_contract_type_validates_and_nothing_else_does() {
    for t in MessageType::ALL {
        assert!(validate(&json!({ "type": t.as_str() })).is_ok());
    }
    for bad in ["scan_rfid", "SCAN", "RFID_RESULTS", ""] {
        assert_eq!(
            validate(&json!({ "type": bad })),
            Err(ValidationError::UnknownType(bad.to_string()))
        );
    }
    assert!(!is_valid(Some(&json!({}))));
}

#[test]
fn test_null_absent_string_and_number_are_invalid() {
    assert!(!is_valid(Some(&json!(null))));
    assert!(!is_valid(None));
    assert!(!is_valid(Some(&json!("string"))));
    assert!(!is_valid(Some(&json!(42))));
}

#[test]
fn test_decoded_text_routes_to_registered_handler() {
    // Arrange
    let registry = HandlerRegistry::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    registry.register_signal(MessageType::ScanRfid, move || {
        c.fetch_add(1, Ordering::SeqCst);
    });

    // Act
    let msg = decode_text(r#"{"type":"SCAN_RFID"}"#).expect("valid message");
    let outcome = registry.dispatch(&msg);

    // Assert
    assert_eq!(outcome, Dispatch::Handled(MessageType::ScanRfid));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_invalid_text_never_reaches_the_registry() {
    let registry = HandlerRegistry::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    registry.register(MessageType::RfidResult, move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });

    for text in ["invalid json", r#"{"invalid":"message"}"#, r#"{"type":"RFID"}"#] {
        match decode_text(text) {
            Ok(msg) => {
                registry.dispatch(&msg);
            }
            Err(BridgeError::Malformed(_)) | Err(BridgeError::Invalid(_)) => {}
            Err(other) => panic!("unexpected error for {text}: {other}"),
        }
    }

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_typed_payloads_cross_the_wire_intact() {
    let registry = HandlerRegistry::new();
    let results = Arc::new(Mutex::new(Vec::new()));
    let statuses = Arc::new(Mutex::new(Vec::new()));
    let errors = Arc::new(Mutex::new(Vec::new()));
    {
        let results = Arc::clone(&results);
        registry.register_typed(move |r: RfidScanResult| results.lock().push(r));
        let statuses = Arc::clone(&statuses);
        registry.register_typed(move |s: ScannerStatus| statuses.lock().push(s));
        let errors = Arc::clone(&errors);
        registry.register_typed(move |e: RfidErrorPayload| errors.lock().push(e));
    }

    let outgoing = [
        Message::from_payload(&RfidScanResult {
            epc: "E2801170000002015B8E5B5B".to_string(),
            tid: Some("123456".to_string()),
            rssi: Some(-50),
            timestamp: 1_700_000_000_000,
        })
        .unwrap(),
        Message::from_payload(&ScannerStatus {
            available: true,
            scanning: true,
            error: None,
        })
        .unwrap(),
        Message::from_payload(&RfidErrorPayload::scanner_not_available()).unwrap(),
    ];

    for msg in &outgoing {
        let text = encode(msg).unwrap();
        registry.dispatch(&decode_text(&text).unwrap());
    }

    let results = results.lock();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].epc, "E2801170000002015B8E5B5B");
    assert_eq!(results[0].rssi, Some(-50));
    assert!(statuses.lock()[0].scanning);
    assert_eq!(errors.lock()[0], RfidErrorPayload::scanner_not_available());
}
