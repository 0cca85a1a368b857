//! Serve command - HTTP OCR service.
//!
//! `GET /health` answers `{"status":"UP"}`. `POST /process` takes a
//! multipart upload in the `file` field and returns the processed
//! document as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Args;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use recibo_core::{DocumentProcessor, PdfError, ProcessResponse, RecError, TextRecognizer};

use super::{build_processor, load_config, resolve_model_dir};

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

/// Processor shared by all requests.
pub type AppState<R> = Arc<DocumentProcessor<R>>;

/// Error body returned by the service.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl From<RecError> for ApiError {
    fn from(err: RecError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let detail = match &err {
            RecError::Image(e) => format!("Archivo de imagen inválido: {}", e),
            RecError::Pdf(PdfError::NoPages) => {
                "No se pudieron extraer páginas del PDF".to_string()
            }
            RecError::Pdf(e) => format!("Error al procesar PDF: {}", e),
            other => format!("Error procesando documento: {}", other),
        };

        Self::new(status, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// Create the service router.
pub fn create_router<R>(processor: AppState<R>, max_upload_bytes: usize) -> Router
where
    R: TextRecognizer + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/process", post(process_document::<R>))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(processor)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "UP" }))
}

async fn process_document<R>(
    State(processor): State<AppState<R>>,
    mut multipart: Multipart,
) -> Result<Json<ProcessResponse>, ApiError>
where
    R: TextRecognizer + Send + Sync + 'static,
{
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(e.status(), e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;

        upload = Some((filename, content_type, bytes));
        break;
    }

    let (filename, content_type, bytes) = upload.ok_or_else(|| {
        ApiError::new(StatusCode::BAD_REQUEST, "Falta el archivo en el campo 'file'")
    })?;

    info!(
        "Received file: name={}, type={}, size={} bytes",
        filename.as_deref().unwrap_or("<unnamed>"),
        content_type.as_deref().unwrap_or("<none>"),
        bytes.len()
    );

    // OCR is CPU-bound, keep it off the async workers
    let result = tokio::task::spawn_blocking(move || {
        processor.process(&bytes, filename.as_deref(), content_type.as_deref())
    })
    .await
    .map_err(|e| {
        error!("Processing task failed: {}", e);
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error procesando documento: {}", e),
        )
    })?;

    match result {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            warn!("Failed to process upload: {}", e);
            Err(e.into())
        }
    }
}

pub async fn run(args: ServeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let model_dir = resolve_model_dir(&config, args.model_dir.as_deref());

    if !config.models.is_complete(&model_dir) {
        warn!(
            "OCR models not found at {}, only text and PDF uploads with embedded text will succeed",
            model_dir.display()
        );
    }

    let processor = Arc::new(build_processor(&config, &model_dir));
    let app = create_router(processor, config.server.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;

    let addr = listener.local_addr()?;
    info!("Listening on http://{}", addr);
    eprintln!("recibo OCR service listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}
