//! WebSocket snapshot broadcaster.
//!
//! One writer task advances the simulation, one sampler task encodes each
//! snapshot exactly once, and every subscriber gets its own forwarding
//! task reading from a shared watch channel. The watch slot is the
//! latest-wins mailbox: a slow subscriber simply observes a gapped
//! subsequence of `seq`, never stale or out-of-order frames, and never
//! delays anyone else.

use super::sampler::SnapshotSampler;
use super::wire;
use crate::config::SimConfig;
use crate::sim::MarketGenerator;
use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// How long shutdown waits for in-flight work before giving up.
const DRAIN_DEADLINE: Duration = Duration::from_secs(1);

/// The sampler publishes `(seq, encoded frame)`; `None` until the first
/// sample lands.
type Frame = Option<(u64, Arc<Vec<u8>>)>;

#[derive(Clone)]
struct AppState {
    frames: watch::Receiver<Frame>,
    subscribers: Arc<AtomicUsize>,
    max_subscribers: usize,
}

/// Run the broadcaster on `addr` until ctrl-c.
///
/// # Errors
/// Propagates bind and accept-loop I/O errors.
pub async fn serve(config: SimConfig, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });
    run(config, listener, shutdown_rx).await
}

/// Run the broadcaster on an existing listener until `shutdown` turns
/// true. Split out from [`serve`] so tests can drive it on an ephemeral
/// port with an explicit shutdown handle.
///
/// # Errors
/// Propagates accept-loop I/O errors.
pub async fn run(
    config: SimConfig,
    listener: TcpListener,
    shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let mut generator = MarketGenerator::new(config.clone());
    generator.seed_book();
    let mut sampler = SnapshotSampler::new(generator.book(), &config);

    let (frames_tx, frames_rx) = watch::channel::<Frame>(None);

    // Writer: the only task mutating the book.
    let mut writer_shutdown = shutdown.clone();
    let writer = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                changed = writer_shutdown.changed() => {
                    if changed.is_err() || *writer_shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    generator.step();
                }
            }
        }
        let stats = generator.stats();
        info!(
            "writer stopped after {} ticks, {} events, {} trades",
            stats.ticks, stats.events, stats.trades
        );
    });

    // Sampler: reads the book at the target cadence, encodes once, and
    // overwrites the shared slot.
    let mut sampler_shutdown = shutdown.clone();
    let period = Duration::from_micros(1_000_000 / u64::from(config.target_hz.max(1)));
    let sampler_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                changed = sampler_shutdown.changed() => {
                    if changed.is_err() || *sampler_shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let snapshot = sampler.sample();
                    match wire::encode_snapshot(&snapshot) {
                        Ok(bytes) => {
                            let _ = frames_tx.send(Some((snapshot.seq, Arc::new(bytes))));
                        }
                        Err(error) => warn!("snapshot encode failed: {error}"),
                    }
                }
            }
        }
    });

    let state = AppState {
        frames: frames_rx,
        subscribers: Arc::new(AtomicUsize::new(0)),
        max_subscribers: config.max_subscribers as usize,
    };
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .with_state(state);

    info!("broadcasting on {}", listener.local_addr()?);
    let mut serve_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = serve_shutdown.wait_for(|stop| *stop).await;
        })
        .await?;

    let drain = async {
        let _ = sampler_task.await;
        let _ = writer.await;
    };
    if tokio::time::timeout(DRAIN_DEADLINE, drain).await.is_err() {
        warn!("shutdown drain exceeded {DRAIN_DEADLINE:?}");
    }
    Ok(())
}

async fn health() -> impl IntoResponse {
    axum::Json(json!({"status": "ok"}))
}

/// Admission slot that releases its place in the subscriber count when
/// dropped, including when an upgrade never completes.
struct SubscriberSlot {
    counter: Arc<AtomicUsize>,
}

impl SubscriberSlot {
    fn acquire(counter: &Arc<AtomicUsize>, cap: usize) -> Option<Self> {
        if counter.fetch_add(1, Ordering::AcqRel) >= cap {
            counter.fetch_sub(1, Ordering::AcqRel);
            return None;
        }
        Some(Self {
            counter: Arc::clone(counter),
        })
    }

    fn active(&self) -> usize {
        self.counter.load(Ordering::Relaxed)
    }
}

impl Drop for SubscriberSlot {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let Some(slot) = SubscriberSlot::acquire(&state.subscribers, state.max_subscribers) else {
        warn!(
            "subscriber rejected: {} already connected",
            state.max_subscribers
        );
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };
    info!("subscriber admitted ({} active)", slot.active());
    ws.on_upgrade(move |socket| handle_subscriber(socket, state.frames.clone(), slot))
}

/// Forward frames to one subscriber until it disconnects or fails a send.
///
/// A send failure gets one retry before the subscriber is declared
/// unhealthy and dropped. Client payloads are ignored; the read side is
/// polled only to notice disconnects promptly.
async fn handle_subscriber(
    socket: WebSocket,
    mut frames: watch::Receiver<Frame>,
    slot: SubscriberSlot,
) {
    let (mut sink, mut reader) = socket.split();
    let mut last_seq: Option<u64> = None;
    let mut delivered: u64 = 0;
    let mut skipped: u64 = 0;

    loop {
        tokio::select! {
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = frames.borrow_and_update().clone();
                let Some((seq, bytes)) = frame else {
                    continue;
                };
                if let Some(last) = last_seq {
                    let gap = seq.saturating_sub(last + 1);
                    if gap > 0 {
                        skipped += gap;
                        debug!("subscriber lagging: {gap} snapshots overwritten");
                    }
                }
                last_seq = Some(seq);

                let message = Message::Binary(bytes.as_ref().clone());
                if sink.send(message.clone()).await.is_err() {
                    if sink.send(message).await.is_err() {
                        warn!("subscriber send failed twice, dropping");
                        break;
                    }
                }
                delivered += 1;
            }
            incoming = reader.next() => {
                match incoming {
                    None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    let _ = sink.close().await;
    info!("subscriber disconnected: delivered {delivered}, skipped {skipped}");
    drop(slot);
}
