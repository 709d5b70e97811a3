mod error;
mod routes;
mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pulse = weekpulse::AsyncWeekpulse::new(weekpulse::Weekpulse::from_env())
        .await
        .expect("Failed to initialize weekpulse client");
    tracing::info!("weekpulse client ready");

    let state = Arc::new(AppState { pulse });

    let app = Router::new()
        .route("/api/report", get(routes::report::get_report))
        .route("/api/buckets", get(routes::report::get_buckets))
        .route("/api/ranking", get(routes::report::get_ranking))
        .route("/api/trend", get(routes::report::get_trend))
        .route("/api/best", get(routes::report::get_best))
        .route("/api/refresh", post(routes::refresh::refresh))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = std::env::var("WEEKPULSE_LISTEN").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
