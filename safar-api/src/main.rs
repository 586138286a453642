use safar_api::{app, AppState};
use safar_booking::FlightEngine;
use safar_infra::{auth_context, Config, HttpFlightProvider};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "safar_api=debug,safar_booking=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting Safar API on port {}", config.server.port);
    tracing::info!("Flight provider at {}", config.provider.base_url);

    let provider = Arc::new(HttpFlightProvider::new(&config.provider)?);
    let auth = Arc::new(auth_context(&config.auth));
    let engine = FlightEngine::new(provider, auth, config.booking.clone());

    let app = app(AppState::new(engine));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
