use std::sync::{Arc, Mutex};

use serde::Deserialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::dashboard::ViewState;
use crate::map::MarkerRenderer;

/// Raw event from the push channel. The channel closing (sender dropped)
/// signals stream completion.
#[derive(Debug, Clone)]
pub enum StreamPayload {
    Message(String),
    Error(String),
}

/// Observable stream lifecycle, surfaced to subscribers through a watch
/// channel. The stream never reconnects by itself; after Failed or Closed no
/// further events are delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamState {
    Live,
    Failed(String),
    Closed,
}

/// A single positional refinement. Only these fields may be patched into the
/// snapshot; name, type and mission always stay whatever the last full
/// refresh said.
#[derive(Debug, Clone, Deserialize)]
struct PositionUpdate {
    norad_id: u32,
    latitude: f64,
    longitude: f64,
    altitude_km: f64,
}

/// Best-effort live position overlay. Consumes push updates between full
/// refresh cycles and reconciles them into the displayed snapshot.
pub struct LiveStream {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
    status_rx: watch::Receiver<StreamState>,
}

impl LiveStream {
    pub fn spawn(
        rx: mpsc::Receiver<StreamPayload>,
        state: Arc<Mutex<ViewState>>,
        markers: MarkerRenderer,
    ) -> Self {
        let (stop_tx, stop_rx) = oneshot::channel();
        let (status_tx, status_rx) = watch::channel(StreamState::Live);
        let join = tokio::spawn(run_stream(rx, stop_rx, status_tx, state, markers));
        Self {
            stop_tx,
            join,
            status_rx,
        }
    }

    pub fn status(&self) -> watch::Receiver<StreamState> {
        self.status_rx.clone()
    }

    /// Releases the subscription at view teardown.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(());
        let _ = self.join.await;
    }
}

async fn run_stream(
    mut rx: mpsc::Receiver<StreamPayload>,
    mut stop_rx: oneshot::Receiver<()>,
    status_tx: watch::Sender<StreamState>,
    state: Arc<Mutex<ViewState>>,
    markers: MarkerRenderer,
) {
    loop {
        // Drain buffered payloads before honoring the stop signal, so updates
        // already pushed by the time of teardown are never lost.
        let payload = tokio::select! {
            biased;
            payload = rx.recv() => payload,
            _ = &mut stop_rx => {
                let _ = status_tx.send(StreamState::Closed);
                return;
            }
        };

        match payload {
            Some(StreamPayload::Message(text)) => match parse_updates(&text) {
                Ok(updates) => apply_updates(&updates, &state, &markers),
                Err(e) => {
                    // Malformed payloads are dropped; the stream lives on.
                    log::warn!("dropping malformed stream payload: {}", e);
                }
            },
            Some(StreamPayload::Error(reason)) => {
                log::error!("live position stream failed: {}", reason);
                let _ = status_tx.send(StreamState::Failed(reason));
                return;
            }
            None => {
                log::info!("live position stream closed");
                let _ = status_tx.send(StreamState::Closed);
                return;
            }
        }
    }
}

/// The upstream pushes either a single update object or an array of them.
fn parse_updates(text: &str) -> Result<Vec<PositionUpdate>, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if value.is_array() {
        serde_json::from_value(value)
    } else {
        serde_json::from_value(value).map(|update: PositionUpdate| vec![update])
    }
}

fn apply_updates(
    updates: &[PositionUpdate],
    state: &Arc<Mutex<ViewState>>,
    markers: &MarkerRenderer,
) {
    let mut state = state.lock().unwrap();
    for update in updates {
        let Some(sat) = state
            .snapshot
            .iter_mut()
            .find(|s| s.norad_id == Some(update.norad_id))
        else {
            log::debug!("stream update for NORAD {} not in snapshot", update.norad_id);
            continue;
        };
        // Positional refinement only; the snapshot stays authoritative for
        // everything else.
        sat.latitude = update.latitude;
        sat.longitude = update.longitude;
        sat.altitude_km = update.altitude_km;
        let patched = sat.clone();
        markers.update_position(&patched);
    }
}
