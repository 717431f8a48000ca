//! HTTP Server for the coupon statistics API.
//!
//! # API Endpoints
//!
//! | Method | Path          | Description                                  |
//! |--------|---------------|----------------------------------------------|
//! | GET    | `/health`     | Health check                                 |
//! | POST   | `/api/upload` | Upload a CSV/XLSX/XLS (multipart `file`)     |
//! | POST   | `/api/report` | Build a report for a dataset and criteria    |
//! | GET    | `/api/logs`   | SSE stream for real-time logs                |
//!
//! Errors are returned as `{ "status": "error", "error": "..." }` with 400 for
//! unreadable uploads or criteria, 404 for unknown datasets and 500 otherwise.

use axum::{
    extract::{Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_response, ReportRequest, ReportResponse, UploadResponse};
use crate::cache::DatasetCache;
use crate::config::ReportConfig;
use crate::error::{PipelineError, ServerError, ServerResult};
use crate::models::FilterCriteria;
use crate::parser::SourceFormat;
use crate::transform::pipeline::{build_report, load_dataset};

/// Shared state behind every handler.
pub struct AppState {
    pub config: ReportConfig,
    pub cache: DatasetCache,
}

impl AppState {
    pub fn new(config: ReportConfig) -> Self {
        Self { config, cache: DatasetCache::default() }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_)
            | ServerError::Pipeline(PipelineError::Load(_))
            | ServerError::Pipeline(PipelineError::InvalidCriteria(_)) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Pipeline(PipelineError::Config(_)) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            log_error(self.to_string());
        }
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

/// Routes bound to `state`.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload", post(upload))
        .route("/api/report", post(report))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(port: u16, config: ReportConfig) -> std::io::Result<()> {
    let app = router(Arc::new(AppState::new(config)));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    eprintln!("couponstats server running on http://localhost:{}", port);
    eprintln!("   POST /api/upload - Upload extract");
    eprintln!("   POST /api/report - Build report");
    eprintln!("   GET  /api/logs   - SSE log stream");
    eprintln!("   GET  /health     - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "couponstats",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "report": "POST /api/report",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // lagged receivers skip the entries they missed
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ServerResult<Json<UploadResponse>> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".into()))?;
    log_info(format!(
        "New upload: {} ({} bytes, {})",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len(),
        SourceFormat::detect(&bytes)
    ));

    let (dataset, cached) = tokio::task::spawn_blocking({
        let state = state.clone();
        move || {
            state
                .cache
                .get_or_load(&bytes, |b| load_dataset(b, &state.config))
        }
    })
    .await
    .map_err(|e| ServerError::Internal(format!("Upload task failed: {}", e)))??;

    if cached {
        log_info(format!("Dataset {} already loaded", dataset.id));
    }
    Ok(Json(UploadResponse::new(&dataset, cached)))
}

async fn report(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReportRequest>,
) -> ServerResult<Json<ReportResponse>> {
    let dataset = state
        .cache
        .get(&request.dataset_id)
        .ok_or_else(|| ServerError::NotFound(request.dataset_id.to_string()))?;

    let records = &dataset.table.records;
    let criteria = request
        .criteria
        .unwrap_or_else(|| FilterCriteria::covering(records));
    let report = build_report(records, &criteria, &state.config)?;

    Ok(Json(ReportResponse::new(dataset.id, report)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    const CSV: &[u8] = b"StrCd;StrNm;CpnNm;SaleDy;Qty\nS1;Store1;TM;20240101;5\nS2;Store2;NR;20240102;10\n";

    fn state_with_dataset() -> (Arc<AppState>, Uuid) {
        let state = Arc::new(AppState::new(ReportConfig::default()));
        let (dataset, _) = state
            .cache
            .get_or_load(CSV, |b| load_dataset(b, &state.config))
            .unwrap();
        let id = dataset.id;
        (state, id)
    }

    #[tokio::test]
    async fn test_report_whole_dataset() {
        let (state, id) = state_with_dataset();
        let request = ReportRequest { dataset_id: id, criteria: None };

        let Json(response) = report(State(state), Json(request)).await.unwrap();
        assert_eq!(response.status, "ready");
        assert_eq!(response.report.summary.total_quantity, 15);
    }

    #[tokio::test]
    async fn test_report_empty_selection() {
        let (state, id) = state_with_dataset();
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let criteria = FilterCriteria::new(day, day).with_coupons(Vec::<String>::new());
        let request = ReportRequest { dataset_id: id, criteria: Some(criteria) };

        let Json(response) = report(State(state), Json(request)).await.unwrap();
        assert_eq!(response.status, "empty");
        assert!(response.report.store_matrix.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_dataset_is_404() {
        let state = Arc::new(AppState::new(ReportConfig::default()));
        let request = ReportRequest { dataset_id: Uuid::nil(), criteria: None };

        let err = report(State(state), Json(request)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_inverted_range_is_400() {
        let (state, id) = state_with_dataset();
        let criteria = FilterCriteria::new(
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        let request = ReportRequest { dataset_id: id, criteria: Some(criteria) };

        let err = report(State(state), Json(request)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
    }

    #[test]
    fn test_router_builds() {
        let _ = router(Arc::new(AppState::new(ReportConfig::default())));
    }
}
