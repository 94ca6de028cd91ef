use shared::{Coordinate, RouteBounds, RouteOrigin, RouteResponse, Waypoint};

use crate::error::RouteError;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Ordered, non-empty list of waypoints. Sequence order is the direction of
/// travel and the list never changes once loaded.
#[derive(Debug, Clone)]
pub struct Route {
    waypoints: Vec<Waypoint>,
    origin: RouteOrigin,
}

impl Route {
    pub fn new(waypoints: Vec<Waypoint>, origin: RouteOrigin) -> Result<Self, RouteError> {
        if waypoints.is_empty() {
            return Err(RouteError::EmptyRoute);
        }
        Ok(Self { waypoints, origin })
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always false: a route cannot be built empty.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn origin(&self) -> RouteOrigin {
        self.origin
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn first(&self) -> &Waypoint {
        &self.waypoints[0]
    }

    /// Number of segments; zero for a single-point route.
    pub fn segment_count(&self) -> usize {
        self.waypoints.len() - 1
    }

    /// Index of the last segment (0 for a single-point route).
    pub fn last_segment(&self) -> usize {
        self.segment_count().saturating_sub(1)
    }

    /// Start and end waypoint of segment `index`.
    pub fn segment(&self, index: usize) -> Option<(&Waypoint, &Waypoint)> {
        Some((self.waypoints.get(index)?, self.waypoints.get(index + 1)?))
    }

    pub fn coordinates(&self) -> Vec<Coordinate> {
        self.waypoints.iter().map(Waypoint::coordinate).collect()
    }

    pub fn bounds(&self) -> RouteBounds {
        let first = self.first();
        self.waypoints.iter().fold(
            RouteBounds {
                min_lat: first.lat,
                max_lat: first.lat,
                min_lng: first.lng,
                max_lng: first.lng,
            },
            |acc, wp| RouteBounds {
                min_lat: acc.min_lat.min(wp.lat),
                max_lat: acc.max_lat.max(wp.lat),
                min_lng: acc.min_lng.min(wp.lng),
                max_lng: acc.max_lng.max(wp.lng),
            },
        )
    }

    pub fn distance_km(&self) -> f64 {
        self.waypoints
            .windows(2)
            .map(|w| haversine_km(w[0].coordinate(), w[1].coordinate()))
            .sum()
    }

    pub fn to_response(&self) -> RouteResponse {
        RouteResponse {
            path: self.waypoints.clone(),
            point_count: self.len(),
            distance_km: self.distance_km(),
            bounds: self.bounds(),
            origin: self.origin,
        }
    }
}

pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlng = (dlng / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlng * sin_dlng;
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}
