use shared::{Coordinate, Waypoint};

use crate::route::Route;

/// Position along segment `segment_index` at `progress` in `[0, 1]`.
///
/// Callers clamp `progress` and keep `segment_index` within
/// [`Route::last_segment`]. A single-point route has no segments and always
/// yields its only waypoint.
pub fn position(route: &Route, segment_index: usize, progress: f64) -> Coordinate {
    match route.segment(segment_index) {
        Some((start, end)) => {
            // exact end points, so segment boundaries never drift
            if progress <= 0.0 {
                start.coordinate()
            } else if progress >= 1.0 {
                end.coordinate()
            } else {
                start.coordinate().interpolate(end.coordinate(), progress)
            }
        }
        None => {
            debug_assert!(
                route.segment_count() == 0,
                "segment {segment_index} out of range for {} segments",
                route.segment_count()
            );
            route.first().coordinate()
        }
    }
}

/// Bearing from `prev` to `next` in degrees clockwise from north, in `[0, 360)`.
///
/// The longitude delta is the x-component and the latitude delta the
/// y-component. Returns `None` for a zero-length segment.
pub fn heading(prev: &Waypoint, next: &Waypoint) -> Option<f64> {
    let dlng = next.lng - prev.lng;
    let dlat = next.lat - prev.lat;
    if dlng == 0.0 && dlat == 0.0 {
        return None;
    }
    let degrees = dlng.atan2(dlat).to_degrees();
    if degrees.is_finite() {
        Some(normalize_degrees(degrees))
    } else {
        None
    }
}

/// `heading`, carrying `fallback` forward across degenerate segments.
pub fn heading_or(prev: &Waypoint, next: &Waypoint, fallback: f64) -> f64 {
    heading(prev, next).unwrap_or(fallback)
}

/// Heading of the first segment that has a direction, or north.
pub fn initial_heading(route: &Route) -> f64 {
    route
        .waypoints()
        .windows(2)
        .find_map(|w| heading(&w[0], &w[1]))
        .unwrap_or(0.0)
}

pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Shortest signed turn from heading `from` to heading `to`, in `(-180, 180]`.
pub fn heading_delta(from: f64, to: f64) -> f64 {
    let delta = (to - from).rem_euclid(360.0);
    if delta > 180.0 { delta - 360.0 } else { delta }
}
