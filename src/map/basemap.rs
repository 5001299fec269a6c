use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use super::error::MapError;
use super::projection::MapProjection;
use super::scene::Scene;

/// Landmass boundary geometry in geographic coordinates, parsed once from a
/// GeoJSON FeatureCollection. Zoom or pan changes re-project this existing
/// geometry; the dataset is never fetched again after the first load.
#[derive(Debug, Clone, Default)]
pub struct BaseMap {
    rings: Vec<Vec<(f64, f64)>>,
}

impl BaseMap {
    pub fn from_file(path: &Path) -> Result<Self, MapError> {
        let text = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&text)?;
        Self::parse(&value)
    }

    /// Collects the rings of every Polygon/MultiPolygon feature (LineStrings
    /// are accepted too). Features with unsupported geometry are skipped.
    pub fn parse(value: &Value) -> Result<Self, MapError> {
        let features = value["features"]
            .as_array()
            .ok_or(MapError::MissingMember("features"))?;

        let mut rings = Vec::new();
        for feature in features {
            let geometry = &feature["geometry"];
            match geometry["type"].as_str() {
                Some("Polygon") => collect_rings(&geometry["coordinates"], &mut rings),
                Some("MultiPolygon") => {
                    if let Some(polygons) = geometry["coordinates"].as_array() {
                        for polygon in polygons {
                            collect_rings(polygon, &mut rings);
                        }
                    }
                }
                Some("LineString") => {
                    if let Some(ring) = extract_ring(&geometry["coordinates"]) {
                        rings.push(ring);
                    }
                }
                _ => {}
            }
        }

        Ok(BaseMap { rings })
    }

    pub fn rings(&self) -> &[Vec<(f64, f64)>] {
        &self.rings
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }
}

fn collect_rings(coordinates: &Value, out: &mut Vec<Vec<(f64, f64)>>) {
    if let Some(rings) = coordinates.as_array() {
        for ring in rings {
            if let Some(ring) = extract_ring(ring) {
                out.push(ring);
            }
        }
    }
}

fn extract_ring(coordinates: &Value) -> Option<Vec<(f64, f64)>> {
    let points = coordinates.as_array()?;
    let ring: Vec<(f64, f64)> = points
        .iter()
        .filter_map(|p| {
            let pair = p.as_array()?;
            Some((pair.first()?.as_f64()?, pair.get(1)?.as_f64()?))
        })
        .collect();
    if ring.is_empty() {
        None
    } else {
        Some(ring)
    }
}

/// Draws the static landmass layer. Rendering replaces the scene's basemap
/// wholesale, so repeated calls (first load, then every zoom change) can
/// never stack duplicate geometry.
#[derive(Clone)]
pub struct BaseMapRenderer {
    scene: Arc<Mutex<Scene>>,
    projection: Arc<Mutex<MapProjection>>,
}

impl BaseMapRenderer {
    pub fn new(scene: Arc<Mutex<Scene>>, projection: Arc<Mutex<MapProjection>>) -> Self {
        Self { scene, projection }
    }

    pub fn render(&self, map: &BaseMap) {
        let projection = self.projection.lock().unwrap().clone();
        let projected: Vec<Vec<(f64, f64)>> = map
            .rings()
            .iter()
            .map(|ring| {
                ring.iter()
                    .map(|&(lon, lat)| projection.project(lon, lat).unwrap_or((0.0, 0.0)))
                    .collect()
            })
            .collect();

        self.scene.lock().unwrap().set_basemap(projected);
    }
}
