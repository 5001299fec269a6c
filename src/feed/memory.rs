use std::path::Path;
use std::sync::Arc;

use chrono::Duration;
use serde::Deserialize;

use crate::dashboard::{FilterCriteria, OrbitSample, SatellitePosition};

use super::{DataFeed, FeedError};

/// One catalog entry: a current position plus its precomputed ground track.
/// Tracks arrive precomputed; this feed never propagates orbits itself.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub position: SatellitePosition,
    #[serde(default)]
    pub track: Vec<OrbitSample>,
}

#[derive(Debug, Deserialize)]
struct Catalog {
    satellites: Vec<CatalogEntry>,
}

/// In-memory snapshot/trajectory feed backed by a YAML catalog file. Filter
/// and pagination semantics mirror the dashboard backend: case-insensitive
/// substring match on name, type and mission, exact NORAD id, inclusive
/// altitude bounds, then plain page slicing.
#[derive(Clone)]
pub struct MemoryFeed {
    entries: Arc<Vec<CatalogEntry>>,
}

impl MemoryFeed {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, FeedError> {
        let text = std::fs::read_to_string(path)?;
        let catalog: Catalog = serde_yaml::from_str(&text)?;
        log::info!(
            "loaded {} satellites from catalog {}",
            catalog.satellites.len(),
            path.display()
        );
        Ok(Self::new(catalog.satellites))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn matching(&self, criteria: &FilterCriteria) -> Vec<&CatalogEntry> {
        self.entries
            .iter()
            .filter(|entry| matches_criteria(&entry.position, criteria))
            .collect()
    }
}

fn matches_criteria(sat: &SatellitePosition, criteria: &FilterCriteria) -> bool {
    if let Some(name) = &criteria.name {
        if !sat.name.to_lowercase().contains(&name.to_lowercase()) {
            return false;
        }
    }
    if let Some(norad_id) = criteria.norad_id {
        if sat.norad_id != Some(norad_id) {
            return false;
        }
    }
    if let Some(sat_type) = &criteria.sat_type {
        match &sat.sat_type {
            Some(t) if t.to_lowercase().contains(&sat_type.to_lowercase()) => {}
            _ => return false,
        }
    }
    if let Some(mission) = &criteria.mission {
        match &sat.mission_description {
            Some(m) if m.to_lowercase().contains(&mission.to_lowercase()) => {}
            _ => return false,
        }
    }
    if let Some(min) = criteria.min_altitude {
        if sat.altitude_km < min {
            return false;
        }
    }
    if let Some(max) = criteria.max_altitude {
        if sat.altitude_km > max {
            return false;
        }
    }
    true
}

impl DataFeed for MemoryFeed {
    async fn fetch_snapshot(
        &self,
        criteria: FilterCriteria,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<SatellitePosition>, FeedError> {
        let matching = self.matching(&criteria);
        let start = (page.max(1) as usize - 1) * page_size as usize;
        Ok(matching
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .map(|entry| entry.position.clone())
            .collect())
    }

    async fn fetch_trajectory(
        &self,
        norad_id: u32,
        lookahead_hours: f64,
        step_minutes: i64,
    ) -> Result<Vec<OrbitSample>, FeedError> {
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.position.norad_id == Some(norad_id))
            .ok_or(FeedError::UnknownSatellite(norad_id))?;

        let Some(first) = entry.track.first() else {
            return Ok(Vec::new());
        };

        let window_end =
            first.timestamp + Duration::seconds((lookahead_hours * 3600.0).round() as i64);
        let step = Duration::minutes(step_minutes.max(0));

        let mut samples = Vec::new();
        let mut next_due = first.timestamp;
        for sample in &entry.track {
            if sample.timestamp > window_end {
                break;
            }
            if sample.timestamp >= next_due {
                samples.push(sample.clone());
                next_due = sample.timestamp + step;
            }
        }
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(
        name: &str,
        norad_id: Option<u32>,
        sat_type: Option<&str>,
        altitude_km: f64,
    ) -> CatalogEntry {
        CatalogEntry {
            position: SatellitePosition {
                name: name.to_string(),
                norad_id,
                sat_type: sat_type.map(String::from),
                mission_description: None,
                latitude: 10.0,
                longitude: 20.0,
                altitude_km,
            },
            track: Vec::new(),
        }
    }

    fn feed() -> MemoryFeed {
        MemoryFeed::new(vec![
            entry("NOAA 19", Some(33591), Some("weather"), 854.0),
            entry("METOP-B", Some(38771), Some("weather"), 820.0),
            entry("ISS (ZARYA)", Some(25544), Some("station"), 420.0),
            entry("UNKNOWN DEBRIS", None, None, 600.0),
        ])
    }

    #[tokio::test]
    async fn filters_match_backend_semantics() {
        let feed = feed();
        let weather = feed
            .fetch_snapshot(
                FilterCriteria {
                    sat_type: Some("WEATHER".into()),
                    ..Default::default()
                },
                1,
                25,
            )
            .await
            .unwrap();
        assert_eq!(weather.len(), 2);

        let named = feed
            .fetch_snapshot(
                FilterCriteria {
                    name: Some("noaa".into()),
                    ..Default::default()
                },
                1,
                25,
            )
            .await
            .unwrap();
        assert_eq!(named.len(), 1);
        assert_eq!(named[0].norad_id, Some(33591));

        let high = feed
            .fetch_snapshot(
                FilterCriteria {
                    min_altitude: Some(500.0),
                    max_altitude: Some(830.0),
                    ..Default::default()
                },
                1,
                25,
            )
            .await
            .unwrap();
        assert_eq!(high.len(), 2);
    }

    #[tokio::test]
    async fn empty_result_is_not_an_error() {
        let feed = feed();
        let none = feed
            .fetch_snapshot(
                FilterCriteria {
                    name: Some("no such satellite".into()),
                    ..Default::default()
                },
                1,
                25,
            )
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn pagination_slices_the_filtered_set() {
        let feed = feed();
        let page1 = feed
            .fetch_snapshot(FilterCriteria::default(), 1, 3)
            .await
            .unwrap();
        let page2 = feed
            .fetch_snapshot(FilterCriteria::default(), 2, 3)
            .await
            .unwrap();
        assert_eq!(page1.len(), 3);
        assert_eq!(page2.len(), 1);
        assert_eq!(page2[0].name, "UNKNOWN DEBRIS");

        let beyond = feed
            .fetch_snapshot(FilterCriteria::default(), 5, 3)
            .await
            .unwrap();
        assert!(beyond.is_empty());
    }

    #[tokio::test]
    async fn trajectory_clips_and_strides_the_track() {
        let start = Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap();
        let mut entry = entry("NOAA 19", Some(33591), Some("weather"), 854.0);
        // Five-minute cadence over four hours.
        entry.track = (0..48)
            .map(|i| OrbitSample {
                timestamp: start + Duration::minutes(5 * i),
                latitude: i as f64,
                longitude: 0.0,
                altitude_km: 854.0,
            })
            .collect();
        let feed = MemoryFeed::new(vec![entry]);

        let samples = feed.fetch_trajectory(33591, 2.0, 10).await.unwrap();
        // Two-hour window at a ten-minute stride: 0, 10, ..., 120 minutes.
        assert_eq!(samples.len(), 13);
        assert_eq!(samples[1].timestamp, start + Duration::minutes(10));
        assert!(samples.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[tokio::test]
    async fn unknown_satellite_is_an_error() {
        let result = feed().fetch_trajectory(99999, 2.0, 10).await;
        assert!(matches!(result, Err(FeedError::UnknownSatellite(99999))));
    }
}
