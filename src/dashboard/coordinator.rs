use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::feed::DataFeed;
use crate::map::{MarkerRenderer, TrajectoryAnimator};

use super::filters::FilterCriteria;
use super::types::{PageState, SatellitePosition};

const FETCH_ERROR_MESSAGE: &str = "Failed to load satellites. Please try again later.";

/// Refresh-cycle phase: Idle -> Loading -> (success | failure) -> Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Loading,
}

/// Shared view state: the displayed snapshot plus the filter/page cursor it
/// was fetched for. The live stream patches positions in here between full
/// refresh cycles.
#[derive(Debug)]
pub struct ViewState {
    pub phase: RefreshPhase,
    pub snapshot: Vec<SatellitePosition>,
    pub error: Option<String>,
    pub page: PageState,
    pub filters: FilterCriteria,
    /// Sequence number of the last response committed to this view.
    /// Monotone: commits only ever move it forward.
    pub applied_seq: u64,
}

impl ViewState {
    fn new(page_size: u32) -> Self {
        Self {
            phase: RefreshPhase::Idle,
            snapshot: Vec::new(),
            error: None,
            page: PageState::new(page_size),
            filters: FilterCriteria::default(),
            applied_seq: 0,
        }
    }
}

/// Ties filter changes, pagination and live refreshes together.
///
/// Every trigger draws a sequence number from a monotone counter at trigger
/// time. A response is only applied while its number is still the most
/// recently issued one, so renders reflect triggers in logical order even
/// when responses complete out of network order.
pub struct RefreshCoordinator<F: DataFeed> {
    feed: F,
    markers: MarkerRenderer,
    animator: TrajectoryAnimator,
    state: Arc<Mutex<ViewState>>,
    issued: Arc<AtomicU64>,
    lookahead_hours: f64,
    step_minutes: i64,
}

impl<F: DataFeed> Clone for RefreshCoordinator<F> {
    fn clone(&self) -> Self {
        Self {
            feed: self.feed.clone(),
            markers: self.markers.clone(),
            animator: self.animator.clone(),
            state: self.state.clone(),
            issued: self.issued.clone(),
            lookahead_hours: self.lookahead_hours,
            step_minutes: self.step_minutes,
        }
    }
}

impl<F: DataFeed> RefreshCoordinator<F> {
    pub fn new(
        feed: F,
        markers: MarkerRenderer,
        animator: TrajectoryAnimator,
        page_size: u32,
        lookahead_hours: f64,
        step_minutes: i64,
    ) -> Self {
        Self {
            feed,
            markers,
            animator,
            state: Arc::new(Mutex::new(ViewState::new(page_size))),
            issued: Arc::new(AtomicU64::new(0)),
            lookahead_hours,
            step_minutes,
        }
    }

    /// Shared handle to the view state, for the live stream and for status
    /// displays.
    pub fn state(&self) -> Arc<Mutex<ViewState>> {
        self.state.clone()
    }

    /// Initial-load trigger, fired once the view is ready.
    pub fn view_ready(&self) -> JoinHandle<()> {
        self.refresh()
    }

    /// Applies new filter criteria. A criteria set structurally equal to the
    /// one already applied is a no-op; otherwise the page resets to 1 and a
    /// refresh starts.
    pub fn apply_filters(&self, criteria: FilterCriteria) -> Option<JoinHandle<()>> {
        {
            let mut state = self.state.lock().unwrap();
            if state.filters == criteria {
                log::debug!("filters unchanged, skipping refresh");
                return None;
            }
            state.filters = criteria;
            state.page.reset();
        }
        Some(self.refresh())
    }

    pub fn reset_filters(&self) -> Option<JoinHandle<()>> {
        self.apply_filters(FilterCriteria::default())
    }

    pub fn next_page(&self) -> JoinHandle<()> {
        self.state.lock().unwrap().page.next();
        self.refresh()
    }

    /// Steps back one page; no refresh fires when already on page 1.
    pub fn previous_page(&self) -> Option<JoinHandle<()>> {
        if self.state.lock().unwrap().page.previous() {
            Some(self.refresh())
        } else {
            None
        }
    }

    /// View teardown: invalidates in-flight responses and running animations
    /// so nothing can mutate a dead view.
    pub fn shutdown(&self) {
        self.issued.fetch_add(1, Ordering::SeqCst);
        self.markers.clear();
        let mut state = self.state.lock().unwrap();
        state.phase = RefreshPhase::Idle;
        state.snapshot.clear();
    }

    fn refresh(&self) -> JoinHandle<()> {
        // The sequence number is taken at trigger time, on the caller's
        // thread, so trigger order and sequence order always agree.
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let (criteria, page, page_size) = {
            let mut state = self.state.lock().unwrap();
            state.phase = RefreshPhase::Loading;
            state.error = None;
            (state.filters.clone(), state.page.page, state.page.page_size)
        };

        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator.run_cycle(seq, criteria, page, page_size).await;
        })
    }

    async fn run_cycle(self, seq: u64, criteria: FilterCriteria, page: u32, page_size: u32) {
        log::debug!(
            "refresh #{}: page {} (size {}) with {:?}",
            seq,
            page,
            page_size,
            criteria
        );
        let result = self.feed.fetch_snapshot(criteria, page, page_size).await;

        if self.issued.load(Ordering::SeqCst) != seq {
            log::debug!("refresh #{} superseded, discarding response", seq);
            return;
        }

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::error!("snapshot fetch failed: {}", e);
                let mut state = self.state.lock().unwrap();
                if self.issued.load(Ordering::SeqCst) != seq || seq <= state.applied_seq {
                    return;
                }
                state.applied_seq = seq;
                state.phase = RefreshPhase::Idle;
                state.error = Some(FETCH_ERROR_MESSAGE.to_string());
                // The previous snapshot stays on screen; stale data beats a
                // blank map.
                return;
            }
        };

        let epoch = {
            // Staleness check and commit share one critical section, and the
            // marker render (which advances the scene epoch) happens inside
            // it; applied_seq never moves backwards.
            let mut state = self.state.lock().unwrap();
            if self.issued.load(Ordering::SeqCst) != seq || seq <= state.applied_seq {
                log::debug!("refresh #{} superseded, discarding response", seq);
                return;
            }
            state.applied_seq = seq;
            state.snapshot = snapshot.clone();
            state.error = None;
            state.phase = RefreshPhase::Idle;
            self.markers.render(&snapshot)
        };
        log::info!("refresh #{}: rendered {} satellites", seq, snapshot.len());

        for sat in &snapshot {
            let Some(norad_id) = sat.norad_id else {
                continue;
            };
            match self
                .feed
                .fetch_trajectory(norad_id, self.lookahead_hours, self.step_minutes)
                .await
            {
                Ok(samples) => {
                    if self.issued.load(Ordering::SeqCst) != seq {
                        return;
                    }
                    self.animator.animate(&samples, norad_id, epoch);
                }
                // One satellite's trajectory failing never rolls back the
                // snapshot or its siblings.
                Err(e) => {
                    log::warn!("trajectory fetch failed for NORAD {}: {}", norad_id, e);
                }
            }
        }
    }
}
