use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::Parser;

use crate::error::ConfigError;
use crate::source::{FALLBACK_POLYLINE, PrimarySource};

const DEFAULT_SEGMENT_DURATION_MS: u64 = 2_000;
const DEFAULT_STEPS_PER_SEGMENT: u32 = 20;
const SAMPLE_ROUTE_PATH: &str = "tracker/data/sample_route.json";

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Replay a vehicle route and serve marker frames to a map widget"
)]
pub struct Args {
    /// HTTP(S) endpoint returning `[{latitude, longitude, timestamp}]`
    #[arg(long, env = "ROUTE_URL")]
    pub route_url: Option<String>,

    /// Local waypoint list, used when no URL is given
    #[arg(long, env = "ROUTE_JSON", default_value = SAMPLE_ROUTE_PATH)]
    pub route_file: PathBuf,

    /// Encoded polyline replayed when the primary source fails
    #[arg(long, env = "FALLBACK_POLYLINE", default_value = FALLBACK_POLYLINE)]
    pub fallback_polyline: String,

    /// Wall-clock time the marker takes to cross one segment
    #[arg(long, env = "SEGMENT_DURATION_MS", default_value_t = DEFAULT_SEGMENT_DURATION_MS)]
    pub segment_duration_ms: u64,

    /// Discrete marker moves per segment
    #[arg(long, env = "STEPS_PER_SEGMENT", default_value_t = DEFAULT_STEPS_PER_SEGMENT)]
    pub steps_per_segment: u32,

    #[arg(long, env = "TRACKER_ADDR", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,
}

impl Args {
    pub fn primary_source(&self) -> PrimarySource {
        match &self.route_url {
            Some(url) => PrimarySource::Url(url.clone()),
            None => PrimarySource::File(self.route_file.clone()),
        }
    }

    pub fn playback(&self) -> Result<PlaybackConfig, ConfigError> {
        PlaybackConfig::new(
            Duration::from_millis(self.segment_duration_ms),
            self.steps_per_segment,
        )
    }
}

/// Pacing of the marker: one segment is crossed in `segment_duration`,
/// split into `steps_per_segment` equal ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackConfig {
    segment_duration: Duration,
    steps_per_segment: u32,
}

impl PlaybackConfig {
    pub fn new(segment_duration: Duration, steps_per_segment: u32) -> Result<Self, ConfigError> {
        if segment_duration.is_zero() {
            return Err(ConfigError::ZeroDuration);
        }
        if steps_per_segment == 0 {
            return Err(ConfigError::ZeroSteps);
        }
        let tick = segment_duration / steps_per_segment;
        if tick < Duration::from_millis(1) {
            return Err(ConfigError::TickTooShort(tick));
        }
        Ok(Self {
            segment_duration,
            steps_per_segment,
        })
    }

    pub fn segment_duration(&self) -> Duration {
        self.segment_duration
    }

    pub fn steps_per_segment(&self) -> u32 {
        self.steps_per_segment
    }

    pub fn tick_interval(&self) -> Duration {
        self.segment_duration / self.steps_per_segment
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            segment_duration: Duration::from_millis(DEFAULT_SEGMENT_DURATION_MS),
            steps_per_segment: DEFAULT_STEPS_PER_SEGMENT,
        }
    }
}
