use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use geo_types::Point;
use gpx::{Gpx, GpxVersion, Time, Track, TrackSegment, Waypoint as GpxWaypoint};
use shared::{RouteOrigin, Waypoint};
use time::OffsetDateTime;

use crate::error::RouteError;
use crate::route::Route;

/// Recorded vehicle track as GPX 1.1, base64 encoded for JSON transport.
///
/// Each track point carries the waypoint's unix timestamp as `<time>`;
/// timestamps outside the representable range are left out.
pub fn encode_route_as_gpx(route: &Route) -> Result<String, RouteError> {
    let track = Track {
        name: Some("vehicle route".into()),
        source: Some(
            match route.origin() {
                RouteOrigin::Primary => "recorded waypoints",
                RouteOrigin::Fallback => "fallback polyline",
            }
            .into(),
        ),
        segments: vec![TrackSegment {
            points: route.waypoints().iter().map(track_point).collect(),
        }],
        ..Default::default()
    };
    let gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some("tracker".into()),
        tracks: vec![track],
        ..Default::default()
    };

    let mut buffer = Vec::new();
    gpx::write(&gpx, &mut buffer)?;
    Ok(BASE64.encode(buffer))
}

fn track_point(wp: &Waypoint) -> GpxWaypoint {
    let mut point = GpxWaypoint::new(Point::new(wp.lng, wp.lat));
    point.time = OffsetDateTime::from_unix_timestamp(wp.timestamp)
        .ok()
        .map(Time::from);
    point
}
