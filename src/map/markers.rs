use std::sync::{Arc, Mutex};

use crate::dashboard::SatellitePosition;

use super::projection::MapProjection;
use super::scene::{Scene, SceneMarker};

/// Draws the satellite markers for the current snapshot. One call is one
/// full render pass: it tears down every marker and orbit path from the
/// outgoing snapshot before drawing the new one, which also invalidates all
/// in-flight trajectory animations tied to the old snapshot.
#[derive(Clone)]
pub struct MarkerRenderer {
    scene: Arc<Mutex<Scene>>,
    projection: Arc<Mutex<MapProjection>>,
}

impl MarkerRenderer {
    pub fn new(scene: Arc<Mutex<Scene>>, projection: Arc<Mutex<MapProjection>>) -> Self {
        Self { scene, projection }
    }

    /// Renders the snapshot and returns the scene epoch that tags this pass.
    /// Positions whose projection fails land at the viewport origin instead
    /// of being dropped; silently omitting them would hide bad data.
    pub fn render(&self, snapshot: &[SatellitePosition]) -> u64 {
        let projection = self.projection.lock().unwrap().clone();
        let mut scene = self.scene.lock().unwrap();
        let epoch = scene.begin_snapshot();

        for sat in snapshot {
            let (x, y) = match projection.project(sat.longitude, sat.latitude) {
                Some(point) => point,
                None => {
                    log::warn!(
                        "satellite '{}' at ({}, {}) is off-map, rendering at origin",
                        sat.name,
                        sat.latitude,
                        sat.longitude
                    );
                    (0.0, 0.0)
                }
            };
            scene.push_marker(SceneMarker {
                norad_id: sat.norad_id,
                x,
                y,
                label: tooltip(sat),
            });
        }

        epoch
    }

    /// Moves one marker in place for a live position update. The snapshot
    /// epoch is left untouched so running animations keep their validity.
    pub fn update_position(&self, sat: &SatellitePosition) -> bool {
        let Some(norad_id) = sat.norad_id else {
            return false;
        };
        let projection = self.projection.lock().unwrap().clone();
        let (x, y) = projection
            .project(sat.longitude, sat.latitude)
            .unwrap_or((0.0, 0.0));
        self.scene
            .lock()
            .unwrap()
            .move_marker(norad_id, x, y, tooltip(sat))
    }

    /// Tears the marker layer down without drawing a replacement. Used at
    /// view teardown so no animation task can touch the dead view.
    pub fn clear(&self) {
        self.scene.lock().unwrap().begin_snapshot();
    }
}

fn tooltip(sat: &SatellitePosition) -> String {
    format!(
        "Name: {}\nNORAD: {}\nType: {}\nMission: {}\nLat: {:.2}\nLon: {:.2}\nAlt: {} km",
        sat.name,
        sat.norad_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "N/A".to_string()),
        sat.sat_type.as_deref().unwrap_or("N/A"),
        sat.mission_description.as_deref().unwrap_or("N/A"),
        sat.latitude,
        sat.longitude,
        sat.altitude_km
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sat(name: &str, norad_id: Option<u32>, lat: f64, lon: f64) -> SatellitePosition {
        SatellitePosition {
            name: name.to_string(),
            norad_id,
            sat_type: Some("weather".to_string()),
            mission_description: None,
            latitude: lat,
            longitude: lon,
            altitude_km: 820.731,
        }
    }

    fn renderer() -> (MarkerRenderer, Arc<Mutex<Scene>>) {
        let scene = Arc::new(Mutex::new(Scene::new(960.0, 600.0)));
        let projection = Arc::new(Mutex::new(MapProjection::default()));
        (MarkerRenderer::new(scene.clone(), projection), scene)
    }

    #[test]
    fn renders_one_marker_per_position() {
        let (renderer, scene) = renderer();
        let snapshot = vec![
            sat("A", Some(1), 10.0, 20.0),
            sat("B", Some(2), -30.0, 40.0),
            sat("C", None, 0.0, 0.0),
        ];
        renderer.render(&snapshot);
        assert_eq!(scene.lock().unwrap().markers().len(), 3);
    }

    #[test]
    fn rerender_replaces_rather_than_accumulates() {
        let (renderer, scene) = renderer();
        let snapshot = vec![sat("A", Some(1), 10.0, 20.0)];
        let first = renderer.render(&snapshot);
        let second = renderer.render(&snapshot);
        assert_eq!(scene.lock().unwrap().markers().len(), 1);
        assert_eq!(second, first + 1);
    }

    #[test]
    fn off_map_position_falls_back_to_origin() {
        let (renderer, scene) = renderer();
        renderer.render(&[sat("POLAR", Some(3), 90.0, 0.0)]);
        let scene = scene.lock().unwrap();
        assert_eq!(scene.markers()[0].x, 0.0);
        assert_eq!(scene.markers()[0].y, 0.0);
    }

    #[test]
    fn tooltip_formats_like_the_dashboard() {
        let label = tooltip(&sat("NOAA 19", Some(33591), 51.1234, -0.5678));
        assert!(label.contains("Name: NOAA 19"));
        assert!(label.contains("NORAD: 33591"));
        assert!(label.contains("Type: weather"));
        assert!(label.contains("Mission: N/A"));
        assert!(label.contains("Lat: 51.12"));
        assert!(label.contains("Lon: -0.57"));
        // Altitude is reported as given, without rounding.
        assert!(label.contains("Alt: 820.731 km"));
    }

    #[test]
    fn update_position_preserves_epoch_and_moves_marker() {
        let (renderer, scene) = renderer();
        let epoch = renderer.render(&[sat("A", Some(1), 10.0, 20.0)]);
        let before = scene.lock().unwrap().markers()[0].clone();

        let mut moved = sat("A", Some(1), 12.0, 22.0);
        moved.altitude_km = 500.0;
        assert!(renderer.update_position(&moved));

        let scene = scene.lock().unwrap();
        assert_eq!(scene.epoch(), epoch);
        assert_ne!(scene.markers()[0].x, before.x);
        assert!(scene.markers()[0].label.contains("Alt: 500 km"));
    }
}
