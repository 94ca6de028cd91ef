use std::{io, path::PathBuf};

use chrono::Utc;
use shared::{RouteOrigin, Waypoint, WaypointRecord};

use crate::{error::RouteError, polyline, route::Route};

/// Sample route replayed when the primary waypoint list is unavailable.
pub const FALLBACK_POLYLINE: &str = "svu_GotssPp@oAvB{ErD_InAcLg@{JsDcGcGoA{EvBoAbGz@rIfEnF??vGz@";

#[derive(Debug, Clone)]
pub enum PrimarySource {
    Url(String),
    File(PathBuf),
}

impl std::fmt::Display for PrimarySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimarySource::Url(url) => write!(f, "{url}"),
            PrimarySource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Why the primary waypoint list could not be used.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to read waypoint file: {0}")]
    Io(#[from] io::Error),
    #[error("malformed waypoint payload: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("waypoint #{index} has an invalid position")]
    InvalidRecord { index: usize },
    #[error("waypoint payload is empty")]
    EmptyPayload,
}

/// Single-shot loader: primary list first, embedded polyline on any failure.
#[derive(Debug, Clone)]
pub struct RouteSource {
    primary: PrimarySource,
    fallback_polyline: String,
    client: reqwest::Client,
}

impl RouteSource {
    pub fn new(primary: PrimarySource, fallback_polyline: impl Into<String>) -> Self {
        Self {
            primary,
            fallback_polyline: fallback_polyline.into(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn load(&self) -> Result<Route, RouteError> {
        match self.load_primary().await {
            Ok(waypoints) => {
                tracing::info!(
                    "loaded {} waypoints from {}",
                    waypoints.len(),
                    self.primary
                );
                Route::new(waypoints, RouteOrigin::Primary)
            }
            Err(err) => {
                tracing::warn!(
                    "primary route source {} unusable ({err}), falling back to embedded polyline",
                    self.primary
                );
                let route = fallback_route(&self.fallback_polyline);
                if let Err(err) = &route {
                    tracing::error!("fallback route unusable: {err}");
                }
                route
            }
        }
    }

    pub async fn load_primary(&self) -> Result<Vec<Waypoint>, DataLoadError> {
        let body = match &self.primary {
            PrimarySource::Url(url) => {
                self.client
                    .get(url)
                    .send()
                    .await?
                    .error_for_status()?
                    .bytes()
                    .await?
                    .to_vec()
            }
            PrimarySource::File(path) => tokio::fs::read(path).await?,
        };
        parse_records(&body)
    }
}

/// Parse and validate a `[{latitude, longitude, timestamp}]` payload.
pub fn parse_records(body: &[u8]) -> Result<Vec<Waypoint>, DataLoadError> {
    let records: Vec<WaypointRecord> = serde_json::from_slice(body)?;
    if records.is_empty() {
        return Err(DataLoadError::EmptyPayload);
    }

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let waypoint = Waypoint::from(record);
            if waypoint.coordinate().is_valid() {
                Ok(waypoint)
            } else {
                Err(DataLoadError::InvalidRecord { index })
            }
        })
        .collect()
}

/// Decode the fallback polyline, stamping every point with the current time.
pub fn fallback_route(encoded: &str) -> Result<Route, RouteError> {
    let now = Utc::now().timestamp();
    let waypoints = polyline::decode(encoded)?
        .into_iter()
        .map(|coord| Waypoint {
            lat: coord.lat,
            lng: coord.lng,
            timestamp: now,
        })
        .collect();
    Route::new(waypoints, RouteOrigin::Fallback)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SAMPLE: &str = include_str!("../data/sample_route.json");

    fn source_with_file(contents: &str) -> (RouteSource, tempfile::NamedTempFile) {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write fixture");
        let source = RouteSource::new(
            PrimarySource::File(file.path().to_path_buf()),
            FALLBACK_POLYLINE,
        );
        (source, file)
    }

    #[test]
    fn sample_route_parses() {
        let waypoints = parse_records(SAMPLE.as_bytes()).expect("sample route");
        assert!(waypoints.len() >= 2);
        assert!(waypoints.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn rejects_out_of_range_record() {
        let body = br#"[{"latitude": 17.4, "longitude": 78.4, "timestamp": 1},
                        {"latitude": 117.4, "longitude": 78.4, "timestamp": 2}]"#;
        assert!(matches!(
            parse_records(body),
            Err(DataLoadError::InvalidRecord { index: 1 })
        ));
    }

    #[test]
    fn fallback_stamps_current_time() {
        let before = Utc::now().timestamp();
        let route = fallback_route(FALLBACK_POLYLINE).unwrap();
        assert_eq!(route.origin(), RouteOrigin::Fallback);
        assert!(route.len() > 2);
        assert!(route.waypoints().iter().all(|wp| wp.timestamp >= before));
    }

    #[test]
    fn empty_fallback_is_no_route_data() {
        assert!(matches!(fallback_route(""), Err(RouteError::EmptyRoute)));
    }

    #[tokio::test]
    async fn primary_file_wins_when_valid() {
        let (source, _file) = source_with_file(SAMPLE);
        let route = source.load().await.unwrap();
        assert_eq!(route.origin(), RouteOrigin::Primary);
    }

    #[tokio::test]
    async fn empty_primary_uses_fallback() {
        let (source, _file) = source_with_file("[]");
        let route = source.load().await.unwrap();
        assert_eq!(route.origin(), RouteOrigin::Fallback);
        assert!(!route.is_empty());
    }

    #[tokio::test]
    async fn malformed_primary_uses_fallback() {
        let (source, _file) = source_with_file(r#"{"not": "a list"}"#);
        let route = source.load().await.unwrap();
        assert_eq!(route.origin(), RouteOrigin::Fallback);
    }

    #[tokio::test]
    async fn missing_file_uses_fallback() {
        let source = RouteSource::new(
            PrimarySource::File(PathBuf::from("/nonexistent/route.json")),
            FALLBACK_POLYLINE,
        );
        assert!(matches!(
            source.load_primary().await,
            Err(DataLoadError::Io(_))
        ));
        assert_eq!(source.load().await.unwrap().origin(), RouteOrigin::Fallback);
    }

    #[tokio::test]
    async fn both_sources_empty_is_fatal() {
        let (_, file) = source_with_file("[]");
        let source = RouteSource::new(PrimarySource::File(file.path().to_path_buf()), "");
        assert!(matches!(source.load().await, Err(RouteError::EmptyRoute)));
    }
}
