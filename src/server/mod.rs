//! HTTP front end: workbook upload, health check, static files.

pub mod error;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::{InfraError, InfraResult};

pub use error::ApiError;

/// Build the application router.
///
/// - `POST /upload`: multipart workbook -> JSON forest
/// - `GET /health`: liveness probe
/// - everything else: files from `server.static_dir`
pub fn router(container: Arc<ServiceContainer>) -> Router {
    let limit = container.settings.upload.max_bytes;
    let static_dir = container.settings.server.static_dir.clone();

    Router::new()
        .route("/upload", post(upload))
        .route("/health", get(health_check))
        .fallback_service(ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(limit))
        .layer(TraceLayer::new_for_http())
        .with_state(container)
}

/// Bind the configured address.
pub async fn bind(container: &ServiceContainer) -> InfraResult<TcpListener> {
    let addr = container.settings.bind_addr()?;
    TcpListener::bind(addr)
        .await
        .map_err(|e| InfraError::io(format!("bind {}", addr), e))
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, container: Arc<ServiceContainer>) -> InfraResult<()> {
    let addr: Option<SocketAddr> = listener.local_addr().ok();
    info!("serving on {:?}", addr);

    axum::serve(listener, router(container))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| InfraError::Server {
            message: e.to_string(),
        })?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for Ctrl-C, shutdown only by kill: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// Health check handler for the /health endpoint.
async fn health_check() -> &'static str {
    "OK"
}

async fn upload(
    State(container): State<Arc<ServiceContainer>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4();
    async move {
        let field = container.settings.upload.field.clone();
        let (file_name, bytes) = read_file_field(multipart, &field).await?;

        let span = Span::current();
        let service = Arc::clone(&container);
        let body = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            parse_upload(&service, &file_name, &bytes)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("parser task failed: {}", e)))??;

        info!("returning {} bytes of JSON", body.len());
        Ok::<_, ApiError>(([(header::CONTENT_TYPE, "application/json")], body).into_response())
    }
    .instrument(info_span!("upload", %request_id))
    .await
}

/// Store the upload, build the forest, remove the file again.
fn parse_upload(
    container: &ServiceContainer,
    file_name: &str,
    bytes: &[u8],
) -> Result<Vec<u8>, ApiError> {
    let upload = container.uploads.store(file_name, bytes)?;
    let result = container.forest.build_from_path(upload.path());
    if let Err(e) = upload.discard() {
        warn!("cannot remove upload: {}", e);
    }
    result?
        .to_json_vec()
        .map_err(|e| ApiError::Internal(format!("cannot encode forest: {}", e)))
}

/// Find the workbook field; other fields are skipped.
async fn read_file_field(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(field_name) {
            debug!("skipping multipart field {:?}", field.name());
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            return Err(ApiError::BadRequest(format!(
                "uploaded file '{}' is empty",
                file_name
            )));
        }
        debug!("received {} ({} bytes)", file_name, bytes.len());
        return Ok((file_name, bytes.to_vec()));
    }
    Err(ApiError::BadRequest(format!(
        "missing file field '{}'",
        field_name
    )))
}
