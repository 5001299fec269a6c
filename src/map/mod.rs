mod animator;
mod basemap;
pub(crate) mod error;
mod markers;
mod projection;
pub(crate) mod scene;

pub use animator::TrajectoryAnimator;
pub use basemap::{BaseMap, BaseMapRenderer};
pub use markers::MarkerRenderer;
pub use projection::MapProjection;
pub use scene::Scene;
