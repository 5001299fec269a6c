pub(crate) mod memory;

use std::future::Future;

use thiserror::Error;

use crate::dashboard::{FilterCriteria, OrbitSample, SatellitePosition};

pub use memory::MemoryFeed;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("catalog read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unknown satellite: NORAD {0}")]
    UnknownSatellite(u32),
    #[error("feed unavailable: {0}")]
    Unavailable(String),
}

/// The data-feed boundary. Transport (HTTP, files, anything else) lives
/// behind this trait; the dashboard core only sees these two requests.
pub trait DataFeed: Clone + Send + Sync + 'static {
    /// Fetches one page of the snapshot matching the criteria. An empty
    /// result means zero matches, not an error.
    fn fetch_snapshot(
        &self,
        criteria: FilterCriteria,
        page: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<Vec<SatellitePosition>, FeedError>> + Send;

    /// Fetches the time-ordered predicted ground track for one satellite.
    fn fetch_trajectory(
        &self,
        norad_id: u32,
        lookahead_hours: f64,
        step_minutes: i64,
    ) -> impl Future<Output = Result<Vec<OrbitSample>, FeedError>> + Send;
}
