use std::f64::consts::FRAC_PI_4;

/// Spherical Mercator forward projection plus the viewport transform
/// (translation and zoom) it is parameterized by. The projection owns the
/// viewport state; renderers take a snapshot of it per render pass instead of
/// caching projected coordinates across zoom changes.
#[derive(Debug, Clone, PartialEq)]
pub struct MapProjection {
    width: f64,
    height: f64,
    scale: f64,
    translate: (f64, f64),
    zoom: f64,
    zoom_extent: (f64, f64),
}

impl MapProjection {
    /// Centers the map in the viewport the way the dashboard does: the
    /// translation sits at (width/2, height/1.5) so the equator lands below
    /// the vertical midpoint.
    pub fn new(width: f64, height: f64, scale: f64) -> Self {
        Self {
            width,
            height,
            scale,
            translate: (width / 2.0, height / 1.5),
            zoom: 1.0,
            zoom_extent: (1.0, 8.0),
        }
    }

    pub fn with_zoom_extent(mut self, min: f64, max: f64) -> Self {
        self.zoom_extent = (min, max);
        self.zoom = self.zoom.clamp(min, max);
        self
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Maps (longitude, latitude) in degrees to viewport coordinates.
    /// Returns None for non-finite input or latitudes at or beyond the poles,
    /// where the Mercator ordinate asymptotes to infinity. Callers decide the
    /// off-map policy; nothing is ever clamped here.
    pub fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() || lat.abs() >= 90.0 {
            return None;
        }
        let k = self.scale * self.zoom;
        let x = self.translate.0 + k * lon.to_radians();
        let y = self.translate.1 - k * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
        if x.is_finite() && y.is_finite() {
            Some((x, y))
        } else {
            None
        }
    }

    /// Shifts the viewport translation. Never re-derives scale from data.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.translate.0 += dx;
        self.translate.1 += dy;
    }

    /// Sets the zoom factor, clamped into the configured extent. Out-of-range
    /// input is clamped, not rejected.
    pub fn set_zoom(&mut self, zoom: f64) {
        let (min, max) = self.zoom_extent;
        self.zoom = if zoom.is_finite() {
            zoom.clamp(min, max)
        } else {
            min
        };
    }
}

impl Default for MapProjection {
    fn default() -> Self {
        MapProjection::new(960.0, 600.0, 150.0)
    }
}
