use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, instrument};

use crate::db::{
    DailyAverageRow, DatasetRow, DbError, LatestReadingRow, NewMeasurement, ParameterSummaryRow,
    QuickStats, ReportRow,
};

/// Storage format for measurement timestamps (UTC). SQLite's date functions
/// understand it and it orders lexicographically.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone)]
pub struct MeasurementRepository {
    pool: SqlitePool,
}

impl MeasurementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert one measurement stamped with the current time.
    /// Measurements are immutable once written; there is no update or
    /// delete path.
    #[instrument(skip(self, measurement), fields(id_parametro = measurement.id_parametro))]
    pub async fn insert(&self, measurement: &NewMeasurement) -> Result<i64, DbError> {
        let stamp = Utc::now().format(TIMESTAMP_FORMAT).to_string();

        let result = sqlx::query(
            r#"
            INSERT INTO mediciones
                (id_estacion, id_parametro, valor_medido, fecha_medicion,
                 responsable_medicion, condiciones_climaticas, observaciones)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(measurement.id_estacion)
        .bind(measurement.id_parametro)
        .bind(measurement.valor_medido)
        .bind(&stamp)
        .bind(&measurement.responsable_medicion)
        .bind(&measurement.condiciones_climaticas)
        .bind(&measurement.observaciones)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(
            "Inserted measurement {} (value {})",
            id, measurement.valor_medido
        );
        Ok(id)
    }

    /// Newest measurement per parameter, joined with station and parameter.
    #[instrument(skip(self))]
    pub async fn latest_per_parameter(&self) -> Result<Vec<LatestReadingRow>, DbError> {
        debug!("Querying latest measurement per parameter");

        let rows = sqlx::query_as::<_, LatestReadingRow>(
            r#"
            SELECT p.nombre_parametro, m.valor_medido, p.unidad_medida,
                   m.fecha_medicion, e.nombre_estacion, p.valor_limite_permisible
            FROM mediciones m
            JOIN parametros_ambientales p ON m.id_parametro = p.id_parametro
            JOIN estaciones_monitoreo e ON m.id_estacion = e.id_estacion
            WHERE m.fecha_medicion = (
                SELECT MAX(m2.fecha_medicion)
                FROM mediciones m2
                WHERE m2.id_parametro = m.id_parametro
            )
            ORDER BY m.fecha_medicion DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!("Found {} latest readings", rows.len());
        Ok(rows)
    }

    /// Calendar-day averages over the trailing 30 days for parameters whose
    /// name contains `fragment` (case-insensitive), oldest bucket first.
    #[instrument(skip(self), fields(fragment = %fragment))]
    pub async fn daily_averages(&self, fragment: &str) -> Result<Vec<DailyAverageRow>, DbError> {
        debug!("Querying 30-day daily averages");

        let rows = sqlx::query_as::<_, DailyAverageRow>(
            r#"
            SELECT DATE(m.fecha_medicion) AS fecha,
                   ROUND(AVG(m.valor_medido), 2) AS promedio,
                   COUNT(*) AS cantidad
            FROM mediciones m
            JOIN parametros_ambientales p ON m.id_parametro = p.id_parametro
            WHERE LOWER(p.nombre_parametro) LIKE '%' || LOWER(?1) || '%'
              AND m.fecha_medicion >= datetime('now', '-30 days')
            GROUP BY DATE(m.fecha_medicion)
            ORDER BY fecha ASC
            "#,
        )
        .bind(fragment)
        .fetch_all(&self.pool)
        .await?;

        debug!("Found {} daily buckets", rows.len());
        Ok(rows)
    }

    /// The canonical full projection: every measurement joined to its
    /// station and parameter with the derived exceedance state, newest
    /// first, no limit. All exporters consume these rows unmodified.
    #[instrument(skip(self))]
    pub async fn full_dataset(&self) -> Result<Vec<DatasetRow>, DbError> {
        debug!("Querying full dataset projection");

        let rows = sqlx::query_as::<_, DatasetRow>(
            r#"
            SELECT m.fecha_medicion AS fecha,
                   e.nombre_estacion AS estacion,
                   p.nombre_parametro AS parametro,
                   m.valor_medido AS valor,
                   p.unidad_medida AS unidad,
                   p.valor_limite_permisible AS limite,
                   m.responsable_medicion AS responsable,
                   m.condiciones_climaticas AS condiciones,
                   m.observaciones AS observaciones,
                   CASE
                       WHEN m.valor_medido > p.valor_limite_permisible THEN 'Excede límite'
                       ELSE 'Normal'
                   END AS estado
            FROM mediciones m
            JOIN estaciones_monitoreo e ON m.id_estacion = e.id_estacion
            JOIN parametros_ambientales p ON m.id_parametro = p.id_parametro
            ORDER BY m.fecha_medicion DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!("Full dataset has {} rows", rows.len());
        Ok(rows)
    }

    /// Latest `limit` measurements for the reports listing.
    #[instrument(skip(self))]
    pub async fn recent_with_status(&self, limit: i64) -> Result<Vec<ReportRow>, DbError> {
        let rows = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT m.fecha_medicion AS fecha,
                   e.nombre_estacion AS estacion,
                   p.nombre_parametro AS parametro,
                   m.valor_medido AS valor,
                   p.unidad_medida AS unidad,
                   p.valor_limite_permisible AS limite,
                   m.responsable_medicion AS responsable,
                   CASE
                       WHEN m.valor_medido > p.valor_limite_permisible THEN 'Excede límite'
                       ELSE 'Normal'
                   END AS estado
            FROM mediciones m
            JOIN estaciones_monitoreo e ON m.id_estacion = e.id_estacion
            JOIN parametros_ambientales p ON m.id_parametro = p.id_parametro
            ORDER BY m.fecha_medicion DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!("Found {} recent measurements", rows.len());
        Ok(rows)
    }

    /// Per-parameter count/avg/min/max over the trailing 30 days.
    #[instrument(skip(self))]
    pub async fn parameter_summaries(&self) -> Result<Vec<ParameterSummaryRow>, DbError> {
        let rows = sqlx::query_as::<_, ParameterSummaryRow>(
            r#"
            SELECT p.nombre_parametro AS parametro,
                   COUNT(*) AS total_mediciones,
                   AVG(m.valor_medido) AS promedio,
                   MIN(m.valor_medido) AS minimo,
                   MAX(m.valor_medido) AS maximo
            FROM mediciones m
            JOIN parametros_ambientales p ON m.id_parametro = p.id_parametro
            WHERE m.fecha_medicion >= datetime('now', '-30 days')
            GROUP BY p.nombre_parametro
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!("Found summaries for {} parameters", rows.len());
        Ok(rows)
    }

    /// Dashboard counters: totals, today's count, active stations, newest
    /// record timestamp.
    #[instrument(skip(self))]
    pub async fn quick_stats(&self) -> Result<QuickStats, DbError> {
        let total_mediciones: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM mediciones")
            .fetch_one(&self.pool)
            .await?;

        let mediciones_hoy: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM mediciones WHERE DATE(fecha_medicion) = DATE('now')",
        )
        .fetch_one(&self.pool)
        .await?;

        let estaciones_activas: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM estaciones_monitoreo WHERE estado = 'activa'",
        )
        .fetch_one(&self.pool)
        .await?;

        let ultimo_registro: Option<String> =
            sqlx::query_scalar("SELECT MAX(fecha_medicion) FROM mediciones")
                .fetch_one(&self.pool)
                .await?;

        Ok(QuickStats {
            total_mediciones,
            mediciones_hoy,
            estaciones_activas,
            ultimo_registro,
        })
    }
}
