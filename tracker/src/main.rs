use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracker::{AppState, Session, config::Args, create_router, source::RouteSource};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tracker=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let playback = args.playback()?;
    tracing::info!(
        "segment traversal {:?} in {} steps ({:?} per tick)",
        playback.segment_duration(),
        playback.steps_per_segment(),
        playback.tick_interval()
    );

    let source = RouteSource::new(args.primary_source(), args.fallback_polyline.clone());
    let session = Session::from_load(source.load().await, playback);
    if let Session::Ready(player) = &session {
        let route = player.route();
        tracing::info!(
            "route ready: {} waypoints, {:.2} km ({:?})",
            route.len(),
            route.distance_km(),
            route.origin()
        );
    }

    let app = create_router(AppState {
        session: Arc::new(session),
    });

    tracing::info!("serving tracker on http://{}", args.bind);
    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
