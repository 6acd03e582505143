//! The loopback runner: one tokio task per peer.
//!
//! # Script
//!
//! 1. The shell attaches its scan relay and publishes the reader status.
//! 2. The page seeds its store, attaches the scanner panel and presses
//!    "start scan".
//! 3. Once the relay reports scanning, the simulated reader produces every
//!    configured tag.
//! 4. The page records each tag; after the last one it presses "stop scan".
//! 5. The run ends when the page sees the scanner idle again (or an error,
//!    or `idle_timeout` of silence).  Dropping the page's bridge closes the
//!    page → shell channel, which ends the shell task.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::timeout;
use tracing::{debug, info};

use stockscan_core::domain::product::{Product, ProductInput};
use stockscan_core::protocol::{
    validate, DirectionPolicy, MessageType, Peer, RfidScanResult, ScannerStatus,
};
use stockscan_shell::application::{HostBridge, NativeMessageEvent, ScanRelay, ScriptSurface};
use stockscan_shell::infrastructure::rfid_reader::mock::SimulatedRfidReader;
use stockscan_web::application::{
    HostedBridge, MessageEvent, NativePoster, PanelState, ProductService, RecordScanUseCase,
    ScanOutcome, ScannerPanel,
};
use stockscan_web::infrastructure::event_bus::WindowEventBus;
use stockscan_web::infrastructure::storage::memory::InMemoryProductStore;

use crate::domain::LoopbackConfig;
use crate::infrastructure::transport::{ChannelPoster, LoopbackSurface};

/// What happened on both sides of a run.
#[derive(Debug, Clone)]
pub struct LoopbackReport {
    /// The page's inventory after the run.
    pub products: Vec<Product>,
    /// One entry per `RFID_RESULT` the page recorded.
    pub outcomes: Vec<ScanOutcome>,
    /// Final scanner panel state.
    pub panel: PanelState,
    /// Final status held by the shell's scan relay.
    pub shell_status: ScannerStatus,
    /// Messages the page received from the shell.
    pub delivered_to_page: usize,
    /// Messages the shell received from the page.
    pub delivered_to_shell: usize,
    pub tags_relayed: usize,
    pub reader_starts: usize,
    pub reader_stops: usize,
}

struct ShellReport {
    status: ScannerStatus,
    received: usize,
    tags_relayed: usize,
    reader_starts: usize,
    reader_stops: usize,
}

struct PageReport {
    products: Vec<Product>,
    outcomes: Vec<ScanOutcome>,
    panel: PanelState,
    received: usize,
}

/// Runs both peers to completion.
///
/// # Errors
///
/// Fails if a seed product is invalid, if the page cannot post its scan
/// request, or if either task panics.
pub async fn run_loopback(config: LoopbackConfig) -> anyhow::Result<LoopbackReport> {
    let (to_page, from_shell) = mpsc::unbounded_channel::<Value>();
    let (to_shell, from_page) = mpsc::unbounded_channel::<String>();

    info!("loading page from {}", config.shell.shell.web_app_url);

    let shell = tokio::spawn(run_shell(
        config.shell.direction_policy(),
        config.scanner_available,
        config.tags.clone(),
        to_page,
        from_page,
    ));
    let page = tokio::spawn(run_page(config, to_shell, from_shell));

    let page = page.await.context("page task failed")??;
    let shell = shell.await.context("shell task failed")?;

    Ok(LoopbackReport {
        products: page.products,
        outcomes: page.outcomes,
        panel: page.panel,
        shell_status: shell.status,
        delivered_to_page: page.received,
        delivered_to_shell: shell.received,
        tags_relayed: shell.tags_relayed,
        reader_starts: shell.reader_starts,
        reader_stops: shell.reader_stops,
    })
}

// ── Shell side ────────────────────────────────────────────────────────────────

async fn run_shell(
    policy: DirectionPolicy,
    scanner_available: bool,
    tags: Vec<String>,
    to_page: UnboundedSender<Value>,
    mut from_page: UnboundedReceiver<String>,
) -> ShellReport {
    let surface: Arc<dyn ScriptSurface> = Arc::new(LoopbackSurface::new(to_page));
    let bridge = Arc::new(HostBridge::with_policy(policy));
    bridge.initialize(&surface);

    let reader = Arc::new(SimulatedRfidReader::new(scanner_available));
    let relay = ScanRelay::new(Arc::clone(&bridge), reader.clone());
    relay.attach();

    let mut pending: VecDeque<String> = tags.into();
    let mut received = 0;
    let mut tags_relayed = 0;

    while let Some(text) = from_page.recv().await {
        received += 1;
        let _ = bridge.receive(&NativeMessageEvent::new(text));

        if relay.status().scanning {
            while let Some(tag) = pending.pop_front() {
                if relay.relay_tag(RfidScanResult::captured_now(tag)) {
                    tags_relayed += 1;
                }
            }
        }
    }

    debug!("page closed its channel; shell shutting down");
    let status = relay.status();
    relay.detach();
    bridge.cleanup();

    ShellReport {
        status,
        received,
        tags_relayed,
        reader_starts: reader.start_count(),
        reader_stops: reader.stop_count(),
    }
}

// ── Page side ─────────────────────────────────────────────────────────────────

async fn run_page(
    config: LoopbackConfig,
    to_shell: UnboundedSender<String>,
    mut from_shell: UnboundedReceiver<Value>,
) -> anyhow::Result<PageReport> {
    let policy = if config.shell.bridge.enforce_directions {
        DirectionPolicy::conventional(Peer::Hosted)
    } else {
        DirectionPolicy::permissive()
    };
    let bus = Arc::new(WindowEventBus::new());
    let poster: Arc<dyn NativePoster> = Arc::new(ChannelPoster::new(to_shell));
    let bridge = HostedBridge::with_policy(bus.clone(), Some(poster), policy);
    bridge.initialize();

    let store = Arc::new(InMemoryProductStore::new());
    let service = ProductService::new(store.clone());
    for input in config.seed {
        let name = input.name.clone();
        service
            .create(input)
            .with_context(|| format!("invalid seed product {name:?}"))?;
    }

    let panel = ScannerPanel::new(Arc::clone(&bridge), RecordScanUseCase::new(store.clone()));
    panel.attach();
    panel.start_scan().context("failed to request a scan")?;

    let expected = config.tags.len();
    let mut results = 0;
    let mut received = 0;
    let mut stop_sent = false;
    let mut outcomes = Vec::new();

    loop {
        let value = match timeout(config.idle_timeout, from_shell.recv()).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!("shell closed its channel");
                break;
            }
            Err(_) => {
                debug!(
                    "no message from shell for {}",
                    format_duration(config.idle_timeout)
                );
                break;
            }
        };
        received += 1;
        let message_type = validate(&value).ok();
        bus.dispatch(&MessageEvent::structured(value));
        let state = panel.state();

        match message_type {
            Some(MessageType::RfidResult) => {
                results += 1;
                if let Some(outcome) = state.last_outcome {
                    outcomes.push(outcome);
                }
                if config.register_unknown {
                    register_pending(&panel, &service);
                }
            }
            Some(MessageType::ScannerStatus) => {
                if !state.scanning && (stop_sent || state.error.is_some()) {
                    break;
                }
            }
            _ => {}
        }

        if !stop_sent && state.scanning && results >= expected {
            panel.stop_scan().context("failed to request scan stop")?;
            stop_sent = true;
        }
    }

    bridge.cleanup();
    Ok(PageReport {
        products: service.list()?,
        outcomes,
        panel: panel.state(),
        received,
    })
}

fn register_pending(panel: &ScannerPanel, service: &ProductService) {
    let Some(tag) = panel.take_pending_tag() else {
        return;
    };
    let input = ProductInput::new(format!("Unregistered {tag}"), 1).with_rfid_tag(tag);
    match service.create(input) {
        Ok(product) => info!("registered new product for tag {:?}", product.rfid_tag),
        Err(e) => debug!("could not register unknown tag: {e}"),
    }
}

fn format_duration(d: Duration) -> String {
    format!("{}ms", d.as_millis())
}
