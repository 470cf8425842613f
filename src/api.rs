use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tracing::{debug, error, info, instrument, warn};
use utoipa::OpenApi;

use crate::export;
use crate::services::ingestion_service::MeasurementForm;
use crate::services::{IngestionService, ReportService, ServiceError};

#[derive(Clone)]
pub struct AppState {
    pub ingestion_service: IngestionService,
    pub report_service: ReportService,
    pub pool: SqlitePool,
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Port Monitor Service API",
        description = "Environmental monitoring data entry and reporting for a port facility"
    ),
    paths(
        index,
        monitoring,
        reports,
        add_measurement,
        ingest_batch,
        recent_data,
        chart_data,
        health,
        export_csv,
        export_excel,
        export_pdf,
    ),
    components(schemas(
        crate::db::Station,
        crate::db::Parameter,
        crate::db::DatasetRow,
        crate::db::ReportRow,
        crate::db::ParameterSummaryRow,
        crate::db::QuickStats,
        crate::services::report_service::SnapshotEntry,
        crate::services::report_service::ChartPoint,
        crate::services::report_service::MonitoringCatalog,
        crate::services::report_service::ReportPage,
    ))
)]
pub struct ApiDoc;

/// OpenAPI document for the HTTP surface (also written to disk by the
/// `generate-openapi` binary).
pub fn generate_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/monitoreo", get(monitoring))
        .route("/reportes", get(reports))
        .route("/agregar_medicion", post(add_measurement))
        .route("/api/monitoreo", post(ingest_batch))
        .route("/api/datos/recientes", get(recent_data))
        .route("/api/datos_grafico/{parametro}", get(chart_data))
        .route("/health", get(health))
        .route("/exportar/csv", get(export_csv))
        .route("/exportar/excel", get(export_excel))
        .route("/exportar/pdf", get(export_pdf))
        .route("/api-docs/openapi.json", get(openapi_spec))
        .route("/docs", get(redoc_ui))
        .fallback(not_found)
        .with_state(state)
}

fn internal_error() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "Error interno del servidor"})),
    )
}

/// Dashboard landing data: quick counters over the whole store.
#[utoipa::path(get, path = "/", responses((status = 200, description = "Dashboard statistics")))]
#[instrument(skip(state))]
async fn index(State(state): State<AppState>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let stats = state.report_service.dashboard_stats().await.map_err(|e| {
        error!("Failed to load dashboard statistics: {}", e);
        internal_error()
    })?;

    Ok(Json(json!({ "estadisticas": stats })))
}

/// Active stations and the parameter catalog for form population.
#[utoipa::path(get, path = "/monitoreo", responses((status = 200, description = "Stations and parameters")))]
#[instrument(skip(state))]
async fn monitoring(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let catalog = state.report_service.monitoring_catalog().await.map_err(|e| {
        error!("Failed to load monitoring catalog: {}", e);
        internal_error()
    })?;

    info!(
        "Monitoring catalog: {} stations, {} parameters",
        catalog.estaciones.len(),
        catalog.parametros.len()
    );
    Ok(Json(json!(catalog)))
}

/// Latest measurements and the 30-day per-parameter summary.
#[utoipa::path(get, path = "/reportes", responses((status = 200, description = "Report listing and summary")))]
#[instrument(skip(state))]
async fn reports(State(state): State<AppState>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let page = state.report_service.report_page().await.map_err(|e| {
        error!("Failed to load reports page: {}", e);
        internal_error()
    })?;

    info!(
        "Reports page: {} measurements, {} parameter summaries",
        page.mediciones.len(),
        page.resumen_parametros.len()
    );
    Ok(Json(json!(page)))
}

/// Record a single measurement submitted from the operator form.
///
/// Validation failures answer 200 with `success:false` and a user-facing
/// message naming the offending field; nothing is inserted.
#[utoipa::path(post, path = "/agregar_medicion", responses((status = 200, description = "Insertion outcome")))]
#[instrument(skip(state, form))]
async fn add_measurement(
    State(state): State<AppState>,
    Form(form): Form<MeasurementForm>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    debug!("Form measurement received");

    match state.ingestion_service.add_form_measurement(&form).await {
        Ok(id) => {
            info!("Measurement {} added from form", id);
            Ok(Json(json!({
                "success": true,
                "message": "Medición agregada correctamente",
                "id": id
            })))
        }
        Err(ServiceError::Validation(e)) => {
            warn!("Form measurement rejected: {}", e);
            Ok(Json(json!({"success": false, "message": e.to_string()})))
        }
        Err(e) => {
            error!("Failed to add form measurement: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "message": "Error interno del servidor"})),
            ))
        }
    }
}

/// Ingest a JSON batch of parameter readings from field devices.
///
/// Individual bad values are skipped; only a malformed payload (non-JSON
/// content type, non-object body, empty object) rejects the request.
#[utoipa::path(post, path = "/api/monitoreo", responses(
    (status = 200, description = "Batch outcome with saved count"),
    (status = 400, description = "Malformed payload")
))]
#[instrument(skip(state, headers, body))]
async fn ingest_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false);

    if !is_json {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "message": "Contenido debe ser JSON"})),
        ));
    }

    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        warn!("Batch payload is not valid JSON: {}", e);
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "message": "Contenido debe ser JSON"})),
        )
    })?;

    let readings = match payload.as_object() {
        Some(map) if !map.is_empty() => map,
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({"success": false, "message": "No se recibieron datos válidos"})),
            ));
        }
    };

    match state.ingestion_service.ingest_batch(readings).await {
        Ok(saved) => {
            info!("Batch ingestion saved {} measurements", saved);
            Ok(Json(json!({
                "success": true,
                "message": format!("{saved} mediciones guardadas correctamente"),
                "mediciones_procesadas": saved
            })))
        }
        Err(e) => {
            error!("Batch ingestion failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "message": "Error interno del servidor"})),
            ))
        }
    }
}

/// Latest value per parameter, keyed by normalized parameter slug.
#[utoipa::path(get, path = "/api/datos/recientes", responses((status = 200, description = "Latest snapshot per parameter")))]
#[instrument(skip(state))]
async fn recent_data(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let snapshot = state.report_service.latest_snapshot().await.map_err(|e| {
        error!("Failed to load latest snapshot: {}", e);
        internal_error()
    })?;

    info!("Serving latest snapshot for {} parameters", snapshot.len());
    Ok(Json(json!(snapshot)))
}

/// 30-day daily-average series for parameters matching the name fragment.
#[utoipa::path(get, path = "/api/datos_grafico/{parametro}",
    params(("parametro" = String, Path, description = "Parameter name fragment")),
    responses((status = 200, description = "Chart series, oldest day first")))]
#[instrument(skip(state), fields(parametro = %parametro))]
async fn chart_data(
    State(state): State<AppState>,
    Path(parametro): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let points = state
        .report_service
        .chart_series(&parametro)
        .await
        .map_err(|e| {
            error!("Failed to load chart series for {}: {}", parametro, e);
            internal_error()
        })?;

    info!("Serving {} chart points for {}", points.len(), parametro);
    Ok(Json(json!(points)))
}

/// Service and store health.
#[utoipa::path(get, path = "/health", responses(
    (status = 200, description = "Service healthy"),
    (status = 500, description = "Store unreachable")
))]
#[instrument(skip(state))]
async fn health(State(state): State<AppState>) -> Response {
    debug!("Health check requested");

    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => {
            info!("Health check successful");
            Json(json!({
                "status": "ok",
                "timestamp": Utc::now().to_rfc3339(),
                "message": "Servidor funcionando correctamente",
                "database": "conectada"
            }))
            .into_response()
        }
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "timestamp": Utc::now().to_rfc3339(),
                    "message": "Error en el servidor",
                    "database": "desconectada"
                })),
            )
                .into_response()
        }
    }
}

/// Map export-flow failures onto the HTTP contract: empty store is 404,
/// everything else is a generic 500.
fn export_failure(e: ServiceError) -> (StatusCode, Json<Value>) {
    match e {
        ServiceError::NoData => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "No hay datos para exportar"})),
        ),
        other => {
            error!("Export failed: {}", other);
            internal_error()
        }
    }
}

fn attachment_headers(content_type: &'static str, extension: &str) -> [(header::HeaderName, String); 2] {
    [
        (header::CONTENT_TYPE, content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename={}",
                export::attachment_filename(extension)
            ),
        ),
    ]
}

/// Download the complete dataset as CSV.
#[utoipa::path(get, path = "/exportar/csv", responses(
    (status = 200, description = "CSV attachment"),
    (status = 404, description = "No data to export")
))]
#[instrument(skip(state))]
async fn export_csv(State(state): State<AppState>) -> Result<Response, (StatusCode, Json<Value>)> {
    let rows = state
        .report_service
        .export_dataset()
        .await
        .map_err(export_failure)?;

    let bytes = export::csv::render(&rows).map_err(|e| {
        error!("CSV export failed: {}", e);
        internal_error()
    })?;

    info!("Exporting {} rows as CSV", rows.len());
    Ok((attachment_headers("text/csv; charset=utf-8", "csv"), bytes).into_response())
}

/// Download the complete dataset as an XLSX workbook.
#[utoipa::path(get, path = "/exportar/excel", responses(
    (status = 200, description = "XLSX attachment"),
    (status = 404, description = "No data to export")
))]
#[instrument(skip(state))]
async fn export_excel(
    State(state): State<AppState>,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let rows = state
        .report_service
        .export_dataset()
        .await
        .map_err(export_failure)?;

    let bytes = export::spreadsheet::render(&rows).map_err(|e| {
        error!("Spreadsheet export failed: {}", e);
        internal_error()
    })?;

    info!("Exporting {} rows as XLSX", rows.len());
    Ok((
        attachment_headers(
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "xlsx",
        ),
        bytes,
    )
        .into_response())
}

/// Download the summary report as PDF.
#[utoipa::path(get, path = "/exportar/pdf", responses(
    (status = 200, description = "PDF attachment"),
    (status = 404, description = "No data to export")
))]
#[instrument(skip(state))]
async fn export_pdf(State(state): State<AppState>) -> Result<Response, (StatusCode, Json<Value>)> {
    let rows = state
        .report_service
        .export_dataset()
        .await
        .map_err(export_failure)?;

    let bytes = export::pdf::render(&rows).map_err(|e| {
        error!("PDF export failed: {}", e);
        internal_error()
    })?;

    info!("Exporting {} rows as PDF", rows.len());
    Ok((attachment_headers("application/pdf", "pdf"), bytes).into_response())
}

async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(generate_openapi_spec())
}

async fn redoc_ui() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
  <head>
    <title>Port Monitor API Documentation</title>
    <meta charset="utf-8"/>
    <meta name="viewport" content="width=device-width, initial-scale=1">
  </head>
  <body>
    <redoc spec-url="/api-docs/openapi.json"></redoc>
    <script src="https://cdn.redoc.ly/redoc/latest/bundles/redoc.standalone.js"></script>
  </body>
</html>"#,
    )
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "Página no encontrada", "codigo": 404})),
    )
}
