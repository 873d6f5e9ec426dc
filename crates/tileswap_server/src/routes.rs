//! HTTP routes: level catalog, image relay and static files.

use crate::assets::{self, INDEX_PAGE};
use crate::config::ServerConfig;
use crate::relay::ImageRelay;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tileswap_engine::IMAGE_PROXY_PATH;
use tower::ServiceBuilder;
use tracing::{debug, error, info, instrument};

/// Shared, read-only state for every request.
#[derive(Debug, Clone)]
pub struct AppState {
    config: ServerConfig,
    relay: ImageRelay,
}

impl AppState {
    /// Builds the state, including the relay's upstream client.
    pub fn new(config: ServerConfig) -> Result<Self, reqwest::Error> {
        let relay = ImageRelay::new(config.relay().clone())?;
        Ok(Self { config, relay })
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Query string of the image relay.
#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    url: Option<String>,
}

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/levels", get(levels))
        .route(IMAGE_PROXY_PATH, get(image_proxy))
        .route("/assets/{*path}", get(asset))
        .route("/views/{*path}", get(view))
        .route("/controllers/{*path}", get(controller))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            debug!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(state)
}

/// Binds and serves until the process exits.
#[instrument(skip(config), fields(addr = %config.bind_address()))]
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let addr = config.bind_address();
    let state = Arc::new(AppState::new(config)?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// `GET /api/levels`: the levels file, verbatim.
///
/// The file is read on every request so edits show up without a restart.
#[instrument(skip(state))]
async fn levels(State(state): State<Arc<AppState>>) -> Response {
    let path = state.config.levels_path();
    match tokio::fs::read_to_string(path).await {
        Ok(json) => ([(header::CONTENT_TYPE, "application/json")], json).into_response(),
        Err(e) => {
            error!(error = %e, path = %path.display(), "Failed to read levels");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "failed to read levels" })),
            )
                .into_response()
        }
    }
}

/// `GET /api/image-proxy?url=`.
#[instrument(skip(state, query), fields(url = ?query.url))]
async fn image_proxy(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProxyQuery>,
) -> Response {
    match state.relay.relay(query.url.as_deref()).await {
        Ok(response) => response,
        Err(e) => {
            info!(error = %e, status = %e.status(), "Relay rejected request");
            e.into_response()
        }
    }
}

async fn index(State(state): State<Arc<AppState>>) -> Response {
    serve_file(&state, INDEX_PAGE).await
}

async fn asset(State(state): State<Arc<AppState>>, Path(path): Path<String>) -> Response {
    serve_file(&state, &format!("assets/{}", path)).await
}

async fn view(State(state): State<Arc<AppState>>, Path(path): Path<String>) -> Response {
    serve_file(&state, &format!("views/{}", path)).await
}

async fn controller(State(state): State<Arc<AppState>>, Path(path): Path<String>) -> Response {
    serve_file(&state, &format!("controllers/{}", path)).await
}

/// Reads a file under the static root. Anything unresolvable is a 404.
#[instrument(skip(state))]
async fn serve_file(state: &AppState, relative: &str) -> Response {
    let Some(path) = assets::resolve(state.config.static_root(), relative) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            debug!(bytes = bytes.len(), path = %path.display(), "Serving static file");
            ([(header::CONTENT_TYPE, assets::content_type_for(&path))], bytes).into_response()
        }
        Err(e) => {
            debug!(error = %e, path = %path.display(), "Static file not found");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
