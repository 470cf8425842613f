use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

// Database entity models. Field names mirror the column names so they also
// serialize as the wire vocabulary the HTTP surface exposes.

#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Station {
    pub id_estacion: i64,
    pub nombre_estacion: String,
    pub latitud: Option<f64>,
    pub longitud: Option<f64>,
    pub tipo_estacion: Option<String>,
    pub fecha_instalacion: Option<String>,
    pub estado: String,
}

#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Parameter {
    pub id_parametro: i64,
    pub nombre_parametro: String,
    pub unidad_medida: String,
    pub valor_limite_permisible: f64,
    pub tipo_matriz: Option<String>,
    pub descripcion: Option<String>,
}

/// Fields for a measurement about to be inserted. The row id and timestamp
/// are assigned at insert time; rows are immutable once written.
#[derive(Debug, Clone)]
pub struct NewMeasurement {
    pub id_estacion: i64,
    pub id_parametro: i64,
    pub valor_medido: f64,
    pub responsable_medicion: String,
    pub condiciones_climaticas: String,
    pub observaciones: String,
}

/// One row of the canonical full projection every exporter consumes:
/// measurements joined to station and parameter, newest first, with the
/// derived exceedance state.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, ToSchema)]
pub struct DatasetRow {
    pub fecha: String,
    pub estacion: String,
    pub parametro: String,
    pub valor: f64,
    pub unidad: String,
    pub limite: f64,
    pub responsable: String,
    pub condiciones: String,
    pub observaciones: String,
    pub estado: String,
}

/// Newest measurement per parameter, joined with its station.
#[derive(Debug, Clone, FromRow)]
pub struct LatestReadingRow {
    pub nombre_parametro: String,
    pub valor_medido: f64,
    pub unidad_medida: String,
    pub fecha_medicion: String,
    pub nombre_estacion: String,
    pub valor_limite_permisible: f64,
}

/// One calendar-day bucket of averaged measurements for charting.
#[derive(Debug, Clone, FromRow)]
pub struct DailyAverageRow {
    pub fecha: String,
    pub promedio: f64,
    pub cantidad: i64,
}

/// Latest-measurements listing for the reports page (no free-text columns).
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct ReportRow {
    pub fecha: String,
    pub estacion: String,
    pub parametro: String,
    pub valor: f64,
    pub unidad: String,
    pub limite: f64,
    pub responsable: String,
    pub estado: String,
}

/// Per-parameter aggregate over the trailing 30-day window.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct ParameterSummaryRow {
    pub parametro: String,
    pub total_mediciones: i64,
    pub promedio: f64,
    pub minimo: f64,
    pub maximo: f64,
}

/// Quick dashboard counters.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuickStats {
    pub total_mediciones: i64,
    pub mediciones_hoy: i64,
    pub estaciones_activas: i64,
    pub ultimo_registro: Option<String>,
}
