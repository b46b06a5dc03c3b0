mod engagement;
mod notifications;
mod posts;

use crate::config::AgoraConfig;
use crate::database::Database;
use crate::error::ServiceError;
use anyhow::Result;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: AgoraConfig,
    pub database: Database,
}

pub(crate) type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Forbidden(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl ApiError {
    fn into_response_parts(self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse { message: msg }),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, ErrorResponse { message: msg }),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse { message: msg }),
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        message: "internal server error".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.into_response_parts();
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<ServiceError>() {
            Some(ServiceError::NotFound(_)) => ApiError::NotFound(err.to_string()),
            Some(ServiceError::Unauthorized { .. }) => ApiError::Forbidden(err.to_string()),
            Some(ServiceError::InvalidInput(_)) => ApiError::BadRequest(err.to_string()),
            None => ApiError::Internal(err),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
}

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    version: &'static str,
    api_port: u16,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        api_port: state.config.api_port,
    })
}

/// Every route the service exposes, bound to `state`.
pub fn router(state: AppState) -> Router {
    let max_body_bytes = state.config.http.max_body_bytes;
    Router::new()
        .route("/health", get(health_handler))
        .route("/posts", post(posts::create_post))
        .route(
            "/posts/:id",
            get(posts::get_post)
                .put(posts::edit_post)
                .delete(posts::delete_post),
        )
        .route("/posts/:id/view", post(posts::record_view))
        .route("/posts/:id/discussion", get(posts::get_discussion))
        .route("/posts/:id/comments", post(posts::create_comment))
        .route("/comments/:id", delete(posts::delete_comment))
        .route("/comments/:id/replies", post(posts::create_reply))
        .route("/engagements/toggle", post(engagement::toggle_engagement))
        .route("/engagements/state", post(engagement::viewer_state))
        .route("/notifications", get(notifications::list_notifications))
        .route(
            "/notifications/unread_count",
            get(notifications::unread_count),
        )
        .route("/notifications/read", post(notifications::mark_read))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Binds the configured port, or the next free one above it.
async fn find_available_port(start_port: u16) -> Result<(TcpListener, u16)> {
    const MAX_PORT_ATTEMPTS: u16 = 100;

    for offset in 0..MAX_PORT_ATTEMPTS {
        let Some(port) = start_port.checked_add(offset) else {
            break;
        };
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok((listener, port)),
            Err(e) => {
                if offset == 0 {
                    tracing::debug!(port, error = %e, "port in use, trying next port");
                }
                continue;
            }
        }
    }

    anyhow::bail!(
        "could not find an available port starting at {}",
        start_port
    )
}

pub async fn serve_http(config: AgoraConfig, database: Database) -> Result<()> {
    let (listener, actual_port) = find_available_port(config.api_port).await?;
    if actual_port != config.api_port {
        tracing::warn!(
            requested_port = config.api_port,
            actual_port,
            "configured port was in use, bound to next available port"
        );
    }
    serve_with_listener(listener, config, database).await
}

/// Serves on an already bound listener. Tests bind port 0 and hand the
/// listener over so they know the address up front.
pub async fn serve_with_listener(
    listener: TcpListener,
    config: AgoraConfig,
    database: Database,
) -> Result<()> {
    let addr = listener.local_addr()?;
    let app = router(AppState { config, database });
    tracing::info!(?addr, "HTTP server listening");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
