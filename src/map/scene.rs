use std::collections::BTreeMap;

/// A satellite marker with its tooltip text.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneMarker {
    pub norad_id: Option<u32>,
    pub x: f64,
    pub y: f64,
    pub label: String,
}

/// Retained display list for one map view. Layers are keyed so that a
/// re-render replaces geometry instead of accumulating it, and every snapshot
/// replacement bumps an epoch counter that in-flight animation tasks check
/// before touching the scene again.
#[derive(Debug, Default)]
pub struct Scene {
    epoch: u64,
    width: f64,
    height: f64,
    basemap: Vec<Vec<(f64, f64)>>,
    markers: Vec<SceneMarker>,
    orbit_paths: BTreeMap<u32, Vec<(f64, f64)>>,
    orbit_markers: BTreeMap<u32, (f64, f64)>,
}

impl Scene {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Replaces the static landmass layer wholesale. Calling twice with the
    /// same geometry leaves exactly one copy behind.
    pub fn set_basemap(&mut self, rings: Vec<Vec<(f64, f64)>>) {
        self.basemap = rings;
    }

    pub fn basemap_len(&self) -> usize {
        self.basemap.len()
    }

    /// Starts a new snapshot pass: drops all markers, orbit paths and orbit
    /// markers from the outgoing snapshot and invalidates their animations.
    /// Returns the epoch that tags everything rendered in this pass.
    pub fn begin_snapshot(&mut self) -> u64 {
        self.epoch += 1;
        self.markers.clear();
        self.orbit_paths.clear();
        self.orbit_markers.clear();
        self.epoch
    }

    pub fn push_marker(&mut self, marker: SceneMarker) {
        self.markers.push(marker);
    }

    pub fn markers(&self) -> &[SceneMarker] {
        &self.markers
    }

    /// Moves an existing marker without invalidating the snapshot. Used by
    /// the live stream for positional refinement between refreshes.
    pub fn move_marker(&mut self, norad_id: u32, x: f64, y: f64, label: String) -> bool {
        match self
            .markers
            .iter_mut()
            .find(|m| m.norad_id == Some(norad_id))
        {
            Some(marker) => {
                marker.x = x;
                marker.y = y;
                marker.label = label;
                true
            }
            None => false,
        }
    }

    /// Inserts or replaces the orbit path for one satellite. Refused (returns
    /// false) when the given epoch is no longer current, so a stale trajectory
    /// response cannot draw into a newer snapshot.
    pub fn upsert_orbit_path(&mut self, epoch: u64, norad_id: u32, path: Vec<(f64, f64)>) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.orbit_paths.insert(norad_id, path);
        true
    }

    pub fn orbit_path(&self, norad_id: u32) -> Option<&[(f64, f64)]> {
        self.orbit_paths.get(&norad_id).map(Vec::as_slice)
    }

    pub fn orbit_path_count(&self) -> usize {
        self.orbit_paths.len()
    }

    /// Places the animated marker for one satellite, subject to the same
    /// epoch check as the path it rides along.
    pub fn place_orbit_marker(&mut self, epoch: u64, norad_id: u32, point: (f64, f64)) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.orbit_markers.insert(norad_id, point);
        true
    }

    pub fn orbit_marker(&self, norad_id: u32) -> Option<(f64, f64)> {
        self.orbit_markers.get(&norad_id).copied()
    }

    /// Serializes the current frame as a standalone SVG document, styled the
    /// way the dashboard map looks: grey landmasses, red satellite dots with
    /// tooltips, orange orbit tracks.
    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" \
             viewBox=\"0 0 {} {}\">\n",
            self.width, self.height, self.width, self.height
        ));
        svg.push_str(&format!(
            "  <rect width=\"{}\" height=\"{}\" fill=\"#eef\"/>\n",
            self.width, self.height
        ));

        for ring in &self.basemap {
            if ring.is_empty() {
                continue;
            }
            svg.push_str(&format!(
                "  <path d=\"{}\" fill=\"#b8b8b8\" stroke=\"#fff\"/>\n",
                path_data(ring, true)
            ));
        }

        for (norad_id, path) in &self.orbit_paths {
            if path.is_empty() {
                continue;
            }
            svg.push_str(&format!(
                "  <path class=\"orbit-{}\" d=\"{}\" fill=\"none\" stroke=\"orange\" \
                 stroke-width=\"2\"/>\n",
                norad_id,
                path_data(path, false)
            ));
        }

        for (norad_id, (x, y)) in &self.orbit_markers {
            svg.push_str(&format!(
                "  <circle class=\"orbit-marker-{}\" cx=\"{:.2}\" cy=\"{:.2}\" r=\"5\" \
                 fill=\"red\"/>\n",
                norad_id, x, y
            ));
        }

        for marker in &self.markers {
            svg.push_str(&format!(
                "  <circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"5\" fill=\"red\" stroke=\"#fff\" \
                 stroke-width=\"1\"><title>{}</title></circle>\n",
                marker.x,
                marker.y,
                escape_xml(&marker.label)
            ));
        }

        svg.push_str("</svg>\n");
        svg
    }
}

fn path_data(points: &[(f64, f64)], close: bool) -> String {
    let mut d = String::new();
    for (i, (x, y)) in points.iter().enumerate() {
        let op = if i == 0 { 'M' } else { 'L' };
        d.push_str(&format!("{}{:.2},{:.2}", op, x, y));
    }
    if close {
        d.push('Z');
    }
    d
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
