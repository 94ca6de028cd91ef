use thiserror::Error;

use crate::polyline::PolylineError;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("no route data: primary source and fallback polyline are both empty")]
    EmptyRoute,
    #[error("fallback polyline is invalid: {0}")]
    Fallback(#[from] PolylineError),
    #[error("failed to build GPX document: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("segment duration must be strictly positive")]
    ZeroDuration,
    #[error("steps per segment must be at least 1")]
    ZeroSteps,
    #[error("tick interval of {0:?} is below 1 ms, lower the step count")]
    TickTooShort(std::time::Duration),
}

