use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::dashboard::OrbitSample;

use super::projection::MapProjection;
use super::scene::Scene;

/// Flattening resolution of the smoothed orbit path, in line segments per
/// spline span.
const SPLINE_STEPS: usize = 8;

const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Draws smoothed ground-track paths and animates a marker along them.
///
/// Animations are fire-and-forget: there is no pause or cancel API. Each
/// spawned task captures the scene epoch current at the time its path was
/// drawn and checks it before every frame write, so a snapshot replacement
/// (or view teardown) ends stale animations at their next frame instead of
/// letting them scribble over a newer scene.
#[derive(Clone)]
pub struct TrajectoryAnimator {
    scene: Arc<Mutex<Scene>>,
    projection: Arc<Mutex<MapProjection>>,
    duration: Duration,
}

impl TrajectoryAnimator {
    pub fn new(
        scene: Arc<Mutex<Scene>>,
        projection: Arc<Mutex<MapProjection>>,
        duration: Duration,
    ) -> Self {
        Self {
            scene,
            projection,
            duration,
        }
    }

    /// Draws the smoothed path for one satellite's trajectory and starts the
    /// marker moving along it with linear easing over the configured
    /// duration. Returns the animation task handle, or None when there is
    /// nothing to animate (no samples, a zero-length path, or an already
    /// superseded epoch).
    pub fn animate(
        &self,
        samples: &[OrbitSample],
        norad_id: u32,
        epoch: u64,
    ) -> Option<JoinHandle<()>> {
        if samples.is_empty() {
            log::debug!("no orbit samples for NORAD {}, skipping animation", norad_id);
            return None;
        }

        let projection = self.projection.lock().unwrap().clone();
        // Failed projections fall back to the origin instead of shortening
        // the path, keeping sample count and timing alignment intact.
        let projected: Vec<(f64, f64)> = samples
            .iter()
            .map(|s| projection.project(s.longitude, s.latitude).unwrap_or((0.0, 0.0)))
            .collect();

        let path = basis_spline(&projected, SPLINE_STEPS);
        let total_length = path_length(&path);
        let start_point = path[0];

        {
            let mut scene = self.scene.lock().unwrap();
            if !scene.upsert_orbit_path(epoch, norad_id, path.clone()) {
                log::debug!("snapshot superseded, dropping trajectory for NORAD {}", norad_id);
                return None;
            }
            scene.place_orbit_marker(epoch, norad_id, start_point);
        }

        // Degenerate path: the marker stays parked at the single point.
        if total_length == 0.0 {
            return None;
        }

        let scene = self.scene.clone();
        let duration = self.duration;
        Some(tokio::spawn(async move {
            let mut ticker = interval(FRAME_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let start = Instant::now();

            loop {
                ticker.tick().await;
                let t = (start.elapsed().as_secs_f64() / duration.as_secs_f64()).min(1.0);
                let point = point_at_length(&path, t * total_length);
                if !scene.lock().unwrap().place_orbit_marker(epoch, norad_id, point) {
                    break;
                }
                if t >= 1.0 {
                    break;
                }
            }
        }))
    }
}

/// Flattens a uniform cubic B-spline through the given control points into a
/// polyline. End points are triplicated so the curve starts and ends exactly
/// on the first and last input point, matching the look of the dashboard's
/// basis-curve orbit tracks. Fewer than three points degrade to the raw
/// polyline.
pub fn basis_spline(points: &[(f64, f64)], steps: usize) -> Vec<(f64, f64)> {
    if points.len() < 3 || steps == 0 {
        return points.to_vec();
    }

    let last = points[points.len() - 1];
    let mut control = Vec::with_capacity(points.len() + 4);
    control.push(points[0]);
    control.push(points[0]);
    control.extend_from_slice(points);
    control.push(last);
    control.push(last);

    let mut out = Vec::with_capacity((control.len() - 3) * steps + 1);
    for span in control.windows(4) {
        for step in 0..steps {
            let t = step as f64 / steps as f64;
            out.push(basis_point(span[0], span[1], span[2], span[3], t));
        }
    }
    out.push(last);
    out
}

fn basis_point(
    p0: (f64, f64),
    p1: (f64, f64),
    p2: (f64, f64),
    p3: (f64, f64),
    t: f64,
) -> (f64, f64) {
    let t2 = t * t;
    let t3 = t2 * t;
    let b0 = (1.0 - t).powi(3) / 6.0;
    let b1 = (3.0 * t3 - 6.0 * t2 + 4.0) / 6.0;
    let b2 = (-3.0 * t3 + 3.0 * t2 + 3.0 * t + 1.0) / 6.0;
    let b3 = t3 / 6.0;
    (
        b0 * p0.0 + b1 * p1.0 + b2 * p2.0 + b3 * p3.0,
        b0 * p0.1 + b1 * p1.1 + b2 * p2.1 + b3 * p3.1,
    )
}

pub fn path_length(path: &[(f64, f64)]) -> f64 {
    path.windows(2)
        .map(|pair| segment_length(pair[0], pair[1]))
        .sum()
}

/// Walks the polyline to the point at the given arc-length distance from its
/// start. Distances are clamped to the path's ends; a zero-length or
/// single-point path always yields its only point.
pub fn point_at_length(path: &[(f64, f64)], distance: f64) -> (f64, f64) {
    match path {
        [] => (0.0, 0.0),
        [only] => *only,
        _ => {
            let mut remaining = distance.max(0.0);
            for pair in path.windows(2) {
                let seg = segment_length(pair[0], pair[1]);
                if remaining <= seg && seg > 0.0 {
                    let t = remaining / seg;
                    return (
                        pair[0].0 + (pair[1].0 - pair[0].0) * t,
                        pair[0].1 + (pair[1].1 - pair[0].1) * t,
                    );
                }
                remaining -= seg;
            }
            path[path.len() - 1]
        }
    }
}

fn segment_length(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};

    fn samples(coords: &[(f64, f64)]) -> Vec<OrbitSample> {
        let start = Utc::now();
        coords
            .iter()
            .enumerate()
            .map(|(i, &(lat, lon))| OrbitSample {
                timestamp: start + ChronoDuration::minutes(10 * i as i64),
                latitude: lat,
                longitude: lon,
                altitude_km: 550.0,
            })
            .collect()
    }

    fn animator() -> (TrajectoryAnimator, Arc<Mutex<Scene>>) {
        let scene = Arc::new(Mutex::new(Scene::new(960.0, 600.0)));
        let projection = Arc::new(Mutex::new(MapProjection::default()));
        (
            TrajectoryAnimator::new(scene.clone(), projection, Duration::from_secs(30)),
            scene,
        )
    }

    #[test]
    fn spline_interpolates_its_end_points() {
        let points = [(0.0, 0.0), (10.0, 5.0), (20.0, 0.0), (30.0, 10.0)];
        let path = basis_spline(&points, 8);
        assert_eq!(path[0], points[0]);
        assert_eq!(*path.last().unwrap(), points[3]);
        assert!(path.len() > points.len());
    }

    #[test]
    fn spline_degrades_below_three_points() {
        assert!(basis_spline(&[], 8).is_empty());
        assert_eq!(basis_spline(&[(1.0, 2.0)], 8), vec![(1.0, 2.0)]);
        assert_eq!(
            basis_spline(&[(0.0, 0.0), (4.0, 4.0)], 8),
            vec![(0.0, 0.0), (4.0, 4.0)]
        );
    }

    #[test]
    fn arc_length_walk_is_linear_on_a_straight_path() {
        let path = [(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)];
        assert_eq!(path_length(&path), 20.0);
        assert_eq!(point_at_length(&path, 0.0), (0.0, 0.0));
        assert_eq!(point_at_length(&path, 15.0), (15.0, 0.0));
        // Distances beyond the path clamp to its end.
        assert_eq!(point_at_length(&path, 99.0), (20.0, 0.0));
    }

    #[test]
    fn zero_length_path_never_divides_by_zero() {
        let path = [(5.0, 5.0), (5.0, 5.0)];
        let point = point_at_length(&path, 0.0);
        assert!(point.0.is_finite() && point.1.is_finite());
        assert_eq!(point, (5.0, 5.0));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_trajectory_draws_nothing() {
        let (animator, scene) = animator();
        let epoch = scene.lock().unwrap().begin_snapshot();
        assert!(animator.animate(&[], 1, epoch).is_none());
        assert!(scene.lock().unwrap().orbit_path(1).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn single_sample_parks_the_marker() {
        let (animator, scene) = animator();
        let epoch = scene.lock().unwrap().begin_snapshot();
        let handle = animator.animate(&samples(&[(10.0, 20.0)]), 1, epoch);
        assert!(handle.is_none());

        let scene = scene.lock().unwrap();
        let marker = scene.orbit_marker(1).unwrap();
        assert!(marker.0.is_finite() && marker.1.is_finite());
        assert_eq!(Some(marker), scene.orbit_path(1).map(|p| p[0]));
    }

    #[tokio::test(start_paused = true)]
    async fn marker_reaches_the_path_end() {
        let (animator, scene) = animator();
        let epoch = scene.lock().unwrap().begin_snapshot();
        let track = samples(&[(0.0, 0.0), (10.0, 10.0), (20.0, 20.0), (25.0, 40.0)]);
        let handle = animator.animate(&track, 1, epoch).unwrap();
        handle.await.unwrap();

        let scene = scene.lock().unwrap();
        let path = scene.orbit_path(1).unwrap();
        let end = *path.last().unwrap();
        let marker = scene.orbit_marker(1).unwrap();
        assert!((marker.0 - end.0).abs() < 1e-6);
        assert!((marker.1 - end.1).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_epoch_stops_the_animation() {
        let (animator, scene) = animator();
        let epoch = scene.lock().unwrap().begin_snapshot();
        let track = samples(&[(0.0, 0.0), (10.0, 10.0), (20.0, 20.0), (25.0, 40.0)]);
        let handle = animator.animate(&track, 1, epoch).unwrap();

        // A new snapshot invalidates the token before the first frame runs.
        scene.lock().unwrap().begin_snapshot();
        handle.await.unwrap();
        assert!(scene.lock().unwrap().orbit_marker(1).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_epoch_never_draws_a_path() {
        let (animator, scene) = animator();
        let old = scene.lock().unwrap().begin_snapshot();
        scene.lock().unwrap().begin_snapshot();

        let track = samples(&[(0.0, 0.0), (10.0, 10.0), (20.0, 20.0)]);
        assert!(animator.animate(&track, 1, old).is_none());
        assert!(scene.lock().unwrap().orbit_path(1).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn off_map_samples_keep_the_sample_count() {
        let (animator, scene) = animator();
        let epoch = scene.lock().unwrap().begin_snapshot();
        // Second sample sits on the pole; its projection fails.
        let track = samples(&[(0.0, 0.0), (90.0, 0.0), (20.0, 20.0)]);
        animator.animate(&track, 1, epoch);

        let scene = scene.lock().unwrap();
        let path = scene.orbit_path(1).unwrap();
        assert!((path[0].0 - 480.0).abs() < 1e-6);
        assert!((path[0].1 - 400.0).abs() < 1e-6);
        // The path runs through the fallback origin rather than skipping it.
        assert!(!path.is_empty());
    }
}
