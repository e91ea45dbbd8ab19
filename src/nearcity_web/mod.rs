use std::fmt::Display;
use std::sync::Arc;

use anyhow::Result;
use axum::routing::{delete, get};
use axum::Router;
use tokio::net::ToSocketAddrs;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::CompressionLevel;
use tracing::{info, Level};

use crate::nearcity::config::NearestConfig;
use crate::nearcity::geocoder::Geocoder;
use crate::nearcity::store::CityStore;

mod handlers;

pub struct Options<A> {
    pub store: CityStore,
    pub geocoder: Arc<dyn Geocoder>,
    pub nearest: NearestConfig,
    pub addr: A,
}

#[derive(Clone)]
pub struct AppState {
    pub store: CityStore,
    pub geocoder: Arc<dyn Geocoder>,
    pub nearest: NearestConfig,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/cities/", get(handlers::cities::handle_cities_get).post(handlers::cities::handle_city_create))
        .route("/cities/{city_id}", delete(handlers::cities::handle_city_delete))
        .route("/nearest_cities/", get(handlers::cities::handle_nearest_get))
        .layer(CompressionLayer::new().gzip(true).quality(CompressionLevel::Fastest))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

pub async fn serve<A>(opts: Options<A>) -> Result<()>
where
    A: ToSocketAddrs + Display,
{
    let state = AppState {
        store: opts.store,
        geocoder: opts.geocoder,
        nearest: opts.nearest,
    };

    let app = router(state);

    info!("Starting webserver on http://{}/", opts.addr);
    let listener = tokio::net::TcpListener::bind(opts.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Webserver stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {:?}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {:?}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
