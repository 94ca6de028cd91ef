use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn interpolate(self, other: Self, t: f64) -> Self {
        Self {
            lat: self.lat + (other.lat - self.lat) * t,
            lng: self.lng + (other.lng - self.lng) * t,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A recorded point of the route. `timestamp` orders and labels the point,
/// it never drives playback pacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lng: f64,
    pub timestamp: i64,
}

impl Waypoint {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Record shape served by the primary waypoint endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WaypointRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: i64,
}

impl From<WaypointRecord> for Waypoint {
    fn from(record: WaypointRecord) -> Self {
        Self {
            lat: record.latitude,
            lng: record.longitude,
            timestamp: record.timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPosition {
    pub lat: f64,
    pub lng: f64,
    pub heading_degrees: f64,
}

impl RenderPosition {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub segment_index: usize,
    pub progress: f64,
    pub is_playing: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            segment_index: 0,
            progress: 0.0,
            is_playing: false,
        }
    }
}

/// Text shown next to the map: coordinates with 5 decimals and "point N / total".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Readout {
    pub latitude: String,
    pub longitude: String,
    pub progress: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderFrame {
    pub position: RenderPosition,
    pub full_path: Vec<Coordinate>,
    pub traveled_path: Vec<Coordinate>,
    pub state: PlaybackState,
    pub readout: Readout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FrameView {
    Tracking(RenderFrame),
    NoRouteData { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteOrigin {
    Primary,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse {
    pub path: Vec<Waypoint>,
    pub point_count: usize,
    pub distance_km: f64,
    pub bounds: RouteBounds,
    pub origin: RouteOrigin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpxResponse {
    pub gpx_base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}
