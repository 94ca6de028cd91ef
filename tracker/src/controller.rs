use std::sync::Arc;

use shared::{PlaybackState, RenderPosition};

use crate::{interpolate, route::Route};

/// What a single tick did to the playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not playing, nothing changed.
    Idle,
    /// Moved one step inside the current segment.
    Advanced,
    /// Finished a segment and moved on to the next one.
    SegmentCompleted,
    /// Finished the last segment; playback stopped at the final waypoint.
    Finished,
}

/// State plus the derived marker position, handed to observers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub position: RenderPosition,
}

/// Stopped/Playing state machine over a loaded route.
///
/// Progress is kept as an integer step inside the current segment so that
/// `progress` lands exactly on 0.0 and 1.0. Reaching the end of the last
/// segment switches back to Stopped with the marker pinned on the final
/// waypoint; only Reset makes the route playable again.
#[derive(Debug, Clone)]
pub struct PlaybackController {
    route: Arc<Route>,
    steps_per_segment: u32,
    segment_index: usize,
    step: u32,
    is_playing: bool,
    heading: f64,
}

impl PlaybackController {
    pub fn new(route: Arc<Route>, steps_per_segment: u32) -> Self {
        let heading = interpolate::initial_heading(&route);
        Self {
            route,
            steps_per_segment: steps_per_segment.max(1),
            segment_index: 0,
            step: 0,
            is_playing: false,
            heading,
        }
    }

    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    pub fn progress(&self) -> f64 {
        f64::from(self.step) / f64::from(self.steps_per_segment)
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            segment_index: self.segment_index,
            progress: self.progress(),
            is_playing: self.is_playing,
        }
    }

    /// True once the marker sits on the last waypoint.
    pub fn is_finished(&self) -> bool {
        self.route.segment_count() > 0
            && self.segment_index == self.route.last_segment()
            && self.step == self.steps_per_segment
    }

    pub fn position(&self) -> RenderPosition {
        let coord = interpolate::position(&self.route, self.segment_index, self.progress());
        RenderPosition {
            lat: coord.lat,
            lng: coord.lng,
            heading_degrees: self.heading,
        }
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.state(),
            position: self.position(),
        }
    }

    /// Stopped -> Playing. Refused for routes without a segment, when already
    /// playing, or when the route has been played to the end.
    pub fn start(&mut self) -> bool {
        if self.is_playing || self.route.segment_count() == 0 || self.is_finished() {
            return false;
        }
        self.is_playing = true;
        true
    }

    /// Playing -> Stopped, keeping the current position.
    pub fn pause(&mut self) -> bool {
        if !self.is_playing {
            return false;
        }
        self.is_playing = false;
        true
    }

    pub fn toggle(&mut self) -> bool {
        if self.is_playing {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Back to the first waypoint, stopped. Returns whether anything changed.
    pub fn reset(&mut self) -> bool {
        let changed = self.is_playing || self.segment_index != 0 || self.step != 0;
        self.is_playing = false;
        self.segment_index = 0;
        self.step = 0;
        self.heading = interpolate::initial_heading(&self.route);
        changed
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_playing {
            return TickOutcome::Idle;
        }
        if self.is_finished() {
            self.is_playing = false;
            return TickOutcome::Finished;
        }

        self.step += 1;
        if self.step < self.steps_per_segment {
            return TickOutcome::Advanced;
        }

        if self.segment_index >= self.route.last_segment() {
            self.is_playing = false;
            return TickOutcome::Finished;
        }

        self.segment_index += 1;
        self.step = 0;
        if let Some((start, end)) = self.route.segment(self.segment_index) {
            self.heading = interpolate::heading_or(start, end, self.heading);
        }
        TickOutcome::SegmentCompleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{RouteOrigin, Waypoint};

    const STEPS: u32 = 20;

    fn route(points: &[(f64, f64)]) -> Arc<Route> {
        let waypoints = points
            .iter()
            .enumerate()
            .map(|(i, &(lat, lng))| Waypoint {
                lat,
                lng,
                timestamp: i as i64,
            })
            .collect();
        Arc::new(Route::new(waypoints, RouteOrigin::Primary).unwrap())
    }

    fn hyderabad() -> PlaybackController {
        PlaybackController::new(route(&[(17.40, 78.49), (17.41, 78.50)]), STEPS)
    }

    #[test]
    fn starts_stopped_at_origin() {
        let controller = hyderabad();
        assert_eq!(controller.state(), PlaybackState::default());
        let position = controller.position();
        assert_eq!((position.lat, position.lng), (17.40, 78.49));
    }

    #[test]
    fn halfway_after_ten_ticks() {
        let mut controller = hyderabad();
        assert!(controller.start());
        for _ in 0..10 {
            assert_eq!(controller.tick(), TickOutcome::Advanced);
        }
        let position = controller.position();
        assert!((position.lat - 17.405).abs() < 1e-9);
        assert!((position.lng - 78.495).abs() < 1e-9);
        assert!((position.heading_degrees - 45.0).abs() < 1.0);
    }

    #[test]
    fn halts_on_final_point() {
        let mut controller = hyderabad();
        controller.start();
        for _ in 0..STEPS - 1 {
            controller.tick();
        }
        assert_eq!(controller.tick(), TickOutcome::Finished);
        let state = controller.state();
        assert_eq!(state.segment_index, 0);
        assert_eq!(state.progress, 1.0);
        assert!(!state.is_playing);

        let frozen = controller.snapshot();
        assert_eq!(controller.tick(), TickOutcome::Idle);
        assert_eq!(controller.snapshot(), frozen);
        assert_eq!(controller.position().lat, 17.41);
        assert!(!controller.start(), "finished route needs a reset");
    }

    #[test]
    fn single_point_route_refuses_start() {
        let mut controller = PlaybackController::new(route(&[(17.40, 78.49)]), STEPS);
        assert!(!controller.start());
        assert_eq!(controller.tick(), TickOutcome::Idle);
        assert_eq!(controller.position().heading_degrees, 0.0);
    }

    #[test]
    fn start_and_pause_are_idempotent() {
        let mut controller = hyderabad();
        assert!(controller.start());
        assert!(!controller.start());
        controller.tick();
        assert!(controller.pause());
        assert!(!controller.pause());
        assert_eq!(controller.tick(), TickOutcome::Idle);
        assert_eq!(controller.progress(), 1.0 / f64::from(STEPS));
    }

    #[test]
    fn toggle_flips_between_states() {
        let mut controller = hyderabad();
        assert!(controller.toggle());
        assert!(controller.is_playing());
        assert!(controller.toggle());
        assert!(!controller.is_playing());
    }

    #[test]
    fn zero_length_segment_keeps_heading() {
        let mut controller = PlaybackController::new(
            route(&[(0.0, 0.0), (0.0, 1.0), (0.0, 1.0), (1.0, 1.0)]),
            2,
        );
        controller.start();
        controller.tick();
        assert!((controller.position().heading_degrees - 90.0).abs() < 1e-9);

        assert_eq!(controller.tick(), TickOutcome::SegmentCompleted);
        assert_eq!(controller.state().segment_index, 1);
        let heading = controller.position().heading_degrees;
        assert!(heading.is_finite());
        assert!((heading - 90.0).abs() < 1e-9);

        controller.tick();
        assert_eq!(controller.tick(), TickOutcome::SegmentCompleted);
        assert!(controller.position().heading_degrees.abs() < 1e-9);
    }

    #[test]
    fn reset_restores_initial_heading() {
        let mut controller = PlaybackController::new(
            route(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]),
            1,
        );
        controller.start();
        controller.tick();
        assert!(controller.position().heading_degrees.abs() < 1e-9);
        assert!(controller.reset());
        assert!((controller.position().heading_degrees - 90.0).abs() < 1e-9);
        assert!(!controller.reset());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn points() -> impl Strategy<Value = Vec<(f64, f64)>> {
            prop::collection::vec((-80.0..80.0, -170.0..170.0), 2..8)
        }

        proptest! {
            #[test]
            fn prop_full_playback_takes_steps_times_segments(
                pts in points(),
                steps in 1u32..30
            ) {
                let route = route(&pts);
                let n = route.len();
                let mut controller = PlaybackController::new(route, steps);
                prop_assert!(controller.start());

                let total = steps as usize * (n - 1);
                for i in 0..total {
                    let outcome = controller.tick();
                    prop_assert_ne!(outcome, TickOutcome::Idle, "tick {} idled", i);
                    prop_assert!(controller.state().segment_index <= n - 2);
                }

                let state = controller.state();
                prop_assert_eq!(state.segment_index, n - 2);
                prop_assert_eq!(state.progress, 1.0);
                prop_assert!(!state.is_playing);
                prop_assert_eq!(controller.tick(), TickOutcome::Idle);
                prop_assert_eq!(controller.state(), state);
            }

            #[test]
            fn prop_reset_from_anywhere(
                pts in points(),
                ticks in 0usize..200,
                playing in any::<bool>()
            ) {
                let mut controller = PlaybackController::new(route(&pts), 20);
                controller.start();
                for _ in 0..ticks {
                    controller.tick();
                }
                if !playing {
                    controller.pause();
                }
                controller.reset();
                prop_assert_eq!(controller.state(), PlaybackState {
                    segment_index: 0,
                    progress: 0.0,
                    is_playing: false,
                });
            }
        }
    }
}
