//! Criterion benchmarks for the bridge JSON codec.
//!
//! Measures the three steps every message goes through on each side of the
//! bridge: encoding, decoding + validation, and building the injection script.
//!
//! Run with:
//! ```bash
//! cargo bench --package stockscan-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use stockscan_core::protocol::{
    decode_text, encode, injection_script, validate, Message, MessageType, RfidErrorPayload,
    RfidScanResult, ScannerStatus,
};

// ── Message fixtures ──────────────────────────────────────────────────────────

fn fixtures() -> Vec<(&'static str, Message)> {
    vec![
        ("scan_rfid", Message::new(MessageType::ScanRfid)),
        (
            "rfid_result",
            Message::from_payload(&RfidScanResult {
                epc: "E2801170000002015B8E5B5B".to_string(),
                tid: Some("123456".to_string()),
                rssi: Some(-50),
                timestamp: 1_700_000_000_000,
            })
            .expect("fixture must encode"),
        ),
        (
            "rfid_error",
            Message::from_payload(&RfidErrorPayload::scanner_not_available())
                .expect("fixture must encode"),
        ),
        (
            "scanner_status",
            Message::from_payload(&ScannerStatus {
                available: true,
                scanning: false,
                error: None,
            })
            .expect("fixture must encode"),
        ),
    ]
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for (name, msg) in fixtures() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &msg, |b, msg| {
            b.iter(|| encode(black_box(msg)).expect("encode"))
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for (name, msg) in fixtures() {
        let text = encode(&msg).expect("encode");
        group.bench_with_input(BenchmarkId::from_parameter(name), &text, |b, text| {
            b.iter(|| decode_text(black_box(text)).expect("decode"))
        });
    }
    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let valid = json!({"type": "SCANNER_STATUS", "payload": {"available": true, "scanning": true}});
    let unknown = json!({"type": "NOT_A_TYPE"});
    c.bench_function("validate/valid", |b| b.iter(|| validate(black_box(&valid))));
    c.bench_function("validate/unknown", |b| b.iter(|| validate(black_box(&unknown))));
}

fn bench_injection_script(c: &mut Criterion) {
    let (_, msg) = fixtures().swap_remove(1);
    let text = encode(&msg).expect("encode");
    c.bench_function("injection_script/rfid_result", |b| {
        b.iter(|| injection_script(black_box(&text)))
    });
}

criterion_group!(
    benches,
    bench_encode,
    bench_decode,
    bench_validate,
    bench_injection_script
);
criterion_main!(benches);
