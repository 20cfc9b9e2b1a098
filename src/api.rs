use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::models::RecentBalanceChange;
use crate::service::{BalanceChangeService, QueryFailed};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BalanceChangeService>,
}

/// Generic 500; the cause has already been logged by the service.
pub struct ApiError;

impl From<QueryFailed> for ApiError {
    fn from(_: QueryFailed) -> Self {
        ApiError
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let body = json!({ "statusCode": status.as_u16(), "message": "Error" });
        (status, Json(body)).into_response()
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { "Balance change scanner running" }))
        .route("/block/largest-balance-change", get(largest_balance_change))
        .layer(cors)
        .with_state(state)
}

async fn largest_balance_change(
    State(state): State<AppState>,
) -> Result<Json<RecentBalanceChange>, ApiError> {
    let change = state.service.largest_recent_balance_change().await?;
    Ok(Json(change))
}

pub async fn serve(cfg: &Config, service: BalanceChangeService) -> eyre::Result<()> {
    let state = AppState {
        service: Arc::new(service),
    };
    let app = app_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    info!("API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received, stopping...");
    }
}
