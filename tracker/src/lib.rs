pub mod config;
pub mod controller;
pub mod error;
pub mod gpx_export;
pub mod interpolate;
pub mod player;
pub mod polyline;
pub mod presentation;
pub mod route;
pub mod source;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use shared::{ApiError, FrameView, GpxResponse, RouteResponse};
use tower_http::cors::{Any, CorsLayer};

use crate::config::PlaybackConfig;
use crate::error::RouteError;
use crate::gpx_export::encode_route_as_gpx;
use crate::player::Player;
use crate::presentation::{TracingObserver, frame_view, no_route_view};
use crate::route::Route;

/// Outcome of the one-shot route load at startup.
pub enum Session {
    Ready(Player),
    NoRouteData(String),
}

impl Session {
    pub fn from_load(loaded: Result<Route, RouteError>, config: PlaybackConfig) -> Self {
        match loaded {
            Ok(route) => {
                let player = Player::new(Arc::new(route), config);
                player.subscribe(Arc::new(TracingObserver));
                Session::Ready(player)
            }
            Err(err) => {
                tracing::error!("route playback unavailable: {err}");
                Session::NoRouteData(err.to_string())
            }
        }
    }

    fn player(&self) -> Result<&Player, (StatusCode, Json<ApiError>)> {
        match self {
            Session::Ready(player) => Ok(player),
            Session::NoRouteData(message) => Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiError {
                    message: message.clone(),
                }),
            )),
        }
    }

    pub fn view(&self) -> FrameView {
        match self {
            Session::Ready(player) => frame_view(&player.route(), &player.snapshot()),
            Session::NoRouteData(message) => no_route_view(message),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Session>,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/route", get(route_handler))
        .route("/api/route/gpx", get(gpx_handler))
        .route("/api/frame", get(frame_handler))
        .route("/api/playback/start", post(start_handler))
        .route("/api/playback/pause", post(pause_handler))
        .route("/api/playback/toggle", post(toggle_handler))
        .route("/api/playback/reset", post(reset_handler))
        .layer(cors)
        .with_state(state)
}

async fn route_handler(State(state): State<AppState>) -> ApiResult<RouteResponse> {
    let player = state.session.player()?;
    Ok(Json(player.route().to_response()))
}

async fn gpx_handler(State(state): State<AppState>) -> ApiResult<GpxResponse> {
    let player = state.session.player()?;
    let gpx_base64 = encode_route_as_gpx(&player.route()).map_err(internal_error)?;
    Ok(Json(GpxResponse { gpx_base64 }))
}

async fn frame_handler(State(state): State<AppState>) -> Json<FrameView> {
    Json(state.session.view())
}

async fn start_handler(State(state): State<AppState>) -> ApiResult<FrameView> {
    state.session.player()?.start();
    Ok(Json(state.session.view()))
}

async fn pause_handler(State(state): State<AppState>) -> ApiResult<FrameView> {
    state.session.player()?.pause();
    Ok(Json(state.session.view()))
}

async fn toggle_handler(State(state): State<AppState>) -> ApiResult<FrameView> {
    state.session.player()?.toggle();
    Ok(Json(state.session.view()))
}

async fn reset_handler(State(state): State<AppState>) -> ApiResult<FrameView> {
    state.session.player()?.reset();
    Ok(Json(state.session.view()))
}

fn internal_error(err: RouteError) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError {
            message: err.to_string(),
        }),
    )
}
