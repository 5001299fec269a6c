use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One satellite in the displayed snapshot. Snapshots are immutable values:
/// a refresh replaces the whole list, it never mutates entries in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatellitePosition {
    pub name: String,
    #[serde(default)]
    pub norad_id: Option<u32>,
    #[serde(rename = "type", default)]
    pub sat_type: Option<String>,
    #[serde(default)]
    pub mission_description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_km: f64,
}

/// One point along a predicted ground track. An ordered sequence of these
/// forms the trajectory for a single satellite; trajectories are transient
/// and superseded on every refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitSample {
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_km: f64,
}

/// Pagination cursor. Page numbers start at 1; any filter change resets the
/// cursor back to the first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub page: u32,
    pub page_size: u32,
}

impl PageState {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn next(&mut self) {
        self.page += 1;
    }

    /// Steps back one page. Returns false when already on the first page,
    /// in which case nothing changes and no refresh should be triggered.
    pub fn previous(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_starts_at_one() {
        let page = PageState::new(25);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 25);
    }

    #[test]
    fn previous_floors_at_first_page() {
        let mut page = PageState::new(25);
        assert!(!page.previous());
        assert_eq!(page.page, 1);

        page.next();
        page.next();
        assert_eq!(page.page, 3);
        assert!(page.previous());
        assert_eq!(page.page, 2);
    }

    #[test]
    fn zero_page_size_is_clamped() {
        let page = PageState::new(0);
        assert_eq!(page.page_size, 1);
    }

    #[test]
    fn position_deserializes_wire_names() {
        let sat: SatellitePosition = serde_json::from_str(
            r#"{"name":"ISS (ZARYA)","norad_id":25544,"type":"station",
                "latitude":51.6,"longitude":-0.1,"altitude_km":420.5}"#,
        )
        .unwrap();
        assert_eq!(sat.norad_id, Some(25544));
        assert_eq!(sat.sat_type.as_deref(), Some("station"));
        assert!(sat.mission_description.is_none());
    }
}
