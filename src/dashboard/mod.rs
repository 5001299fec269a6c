mod commands;
pub(crate) mod coordinator;
pub(crate) mod error;
mod filters;
pub(crate) mod types;

pub use commands::SatelliteCommand;
pub use coordinator::{RefreshCoordinator, ViewState};
pub use filters::FilterCriteria;
pub use types::{OrbitSample, SatellitePosition};
