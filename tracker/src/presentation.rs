use shared::{Coordinate, FrameView, PlaybackState, Readout, RenderFrame};

use crate::{controller::PlaybackSnapshot, route::Route};

/// Receives every playback state change, from commands and ticks alike.
///
/// Called with the player's state lock held: implementations must be quick
/// and must not call back into the player.
pub trait PlaybackObserver: Send + Sync {
    fn on_update(&self, snapshot: &PlaybackSnapshot);
}

/// Logs marker movement.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl PlaybackObserver for TracingObserver {
    fn on_update(&self, snapshot: &PlaybackSnapshot) {
        let PlaybackSnapshot { state, position } = snapshot;
        tracing::debug!(
            "marker at {:.5},{:.5} heading {:.1}° (segment {}, progress {:.2}, playing {})",
            position.lat,
            position.lng,
            position.heading_degrees,
            state.segment_index,
            state.progress,
            state.is_playing
        );
    }
}

/// Everything a map renderer needs to draw the current frame.
pub fn compose_frame(route: &Route, snapshot: &PlaybackSnapshot) -> RenderFrame {
    RenderFrame {
        position: snapshot.position,
        full_path: route.coordinates(),
        traveled_path: traveled_path(route, snapshot),
        state: snapshot.state,
        readout: readout(route, snapshot),
    }
}

pub fn frame_view(route: &Route, snapshot: &PlaybackSnapshot) -> FrameView {
    FrameView::Tracking(compose_frame(route, snapshot))
}

pub fn no_route_view(reason: impl std::fmt::Display) -> FrameView {
    FrameView::NoRouteData {
        message: reason.to_string(),
    }
}

/// Waypoints up to the current segment start, then the marker itself.
pub fn traveled_path(route: &Route, snapshot: &PlaybackSnapshot) -> Vec<Coordinate> {
    let reached = (snapshot.state.segment_index + 1).min(route.len());
    let mut path: Vec<Coordinate> = route.waypoints()[..reached]
        .iter()
        .map(|wp| wp.coordinate())
        .collect();
    let marker = snapshot.position.coordinate();
    if path.last() != Some(&marker) {
        path.push(marker);
    }
    path
}

pub fn readout(route: &Route, snapshot: &PlaybackSnapshot) -> Readout {
    Readout {
        latitude: format!("{:.5}", snapshot.position.lat),
        longitude: format!("{:.5}", snapshot.position.lng),
        progress: format!(
            "point {} / {}",
            reached_point(route, &snapshot.state),
            route.len()
        ),
    }
}

/// 1-based number of the last waypoint the marker has reached.
fn reached_point(route: &Route, state: &PlaybackState) -> usize {
    let reached = if state.progress >= 1.0 {
        state.segment_index + 2
    } else {
        state.segment_index + 1
    };
    reached.min(route.len())
}
