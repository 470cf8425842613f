use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use crate::db::{
    DatasetRow, DbError, MeasurementRepository, Parameter, ParameterRepository,
    ParameterSummaryRow, QuickStats, ReportRow, Station, StationRepository,
};
use crate::services::demo;
use crate::services::ServiceError;

/// How many measurements the reports listing shows.
const REPORT_PAGE_LIMIT: i64 = 50;

/// One entry of the latest-values snapshot, keyed by parameter slug.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SnapshotEntry {
    pub valor: f64,
    pub unidad: String,
    pub fecha: String,
    pub estacion: String,
    pub limite: f64,
    pub estado: String,
}

/// One time bucket of the chart series for a parameter.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChartPoint {
    pub fecha: String,
    pub valor: f64,
    pub cantidad: i64,
}

/// Active stations and the full parameter catalog, for form population.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MonitoringCatalog {
    pub estaciones: Vec<Station>,
    pub parametros: Vec<Parameter>,
}

/// Latest measurements plus the 30-day per-parameter summary.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReportPage {
    pub mediciones: Vec<ReportRow>,
    pub resumen_parametros: Vec<ParameterSummaryRow>,
}

#[derive(Clone)]
pub struct ReportService {
    measurements: MeasurementRepository,
    stations: StationRepository,
    parameters: ParameterRepository,
    demo_fallback: bool,
}

impl ReportService {
    pub fn new(
        measurements: MeasurementRepository,
        stations: StationRepository,
        parameters: ParameterRepository,
        demo_fallback: bool,
    ) -> Self {
        Self {
            measurements,
            stations,
            parameters,
            demo_fallback,
        }
    }

    /// Dashboard counters for the landing page.
    pub async fn dashboard_stats(&self) -> Result<QuickStats, DbError> {
        self.measurements.quick_stats().await
    }

    /// Data backing the measurement entry form.
    pub async fn monitoring_catalog(&self) -> Result<MonitoringCatalog, DbError> {
        let estaciones = self.stations.find_active().await?;
        let parametros = self.parameters.find_all_ordered().await?;
        Ok(MonitoringCatalog {
            estaciones,
            parametros,
        })
    }

    /// Data backing the reports page: latest measurements and the 30-day
    /// per-parameter summary.
    pub async fn report_page(&self) -> Result<ReportPage, DbError> {
        let mediciones = self
            .measurements
            .recent_with_status(REPORT_PAGE_LIMIT)
            .await?;
        let resumen_parametros = self.measurements.parameter_summaries().await?;
        Ok(ReportPage {
            mediciones,
            resumen_parametros,
        })
    }

    /// Newest value per parameter, keyed by normalized parameter slug.
    ///
    /// On an empty store the demo fallback (when enabled) substitutes a
    /// single synthetic reading so dependent dashboards stay non-empty.
    #[instrument(skip(self))]
    pub async fn latest_snapshot(&self) -> Result<BTreeMap<String, SnapshotEntry>, DbError> {
        let rows = self.measurements.latest_per_parameter().await?;

        if rows.is_empty() {
            if self.demo_fallback {
                warn!("No measurements in store, serving demo snapshot");
                return Ok(demo::snapshot());
            }
            debug!("No measurements in store and demo fallback disabled");
            return Ok(BTreeMap::new());
        }

        let mut entries = BTreeMap::new();
        for row in rows {
            let estado = if row.valor_medido > row.valor_limite_permisible {
                "alerta"
            } else {
                "normal"
            };
            entries.insert(
                parameter_slug(&row.nombre_parametro),
                SnapshotEntry {
                    valor: row.valor_medido,
                    unidad: row.unidad_medida,
                    fecha: row.fecha_medicion,
                    estacion: row.nombre_estacion,
                    limite: row.valor_limite_permisible,
                    estado: estado.to_string(),
                },
            );
        }

        info!("Snapshot holds {} parameters", entries.len());
        Ok(entries)
    }

    /// Daily averages over the trailing 30 days for parameters matching the
    /// given name fragment, oldest bucket first. Falls back to the demo
    /// series when nothing matches and the fallback is enabled.
    #[instrument(skip(self), fields(fragment = %fragment))]
    pub async fn chart_series(&self, fragment: &str) -> Result<Vec<ChartPoint>, DbError> {
        let rows = self.measurements.daily_averages(fragment).await?;

        if rows.is_empty() {
            if self.demo_fallback {
                warn!("No chart data for {}, serving demo series", fragment);
                return Ok(demo::chart_series());
            }
            return Ok(Vec::new());
        }

        let points = rows
            .into_iter()
            .map(|row| ChartPoint {
                fecha: row.fecha,
                valor: row.promedio,
                cantidad: row.cantidad,
            })
            .collect::<Vec<_>>();

        info!("Chart series for {} has {} points", fragment, points.len());
        Ok(points)
    }

    /// The canonical projection all exporters consume. Fails with `NoData`
    /// when the store holds no measurements.
    #[instrument(skip(self))]
    pub async fn export_dataset(&self) -> Result<Vec<DatasetRow>, ServiceError> {
        let rows = self.measurements.full_dataset().await?;
        if rows.is_empty() {
            return Err(ServiceError::NoData);
        }
        Ok(rows)
    }
}

/// Normalize a parameter name into a snapshot key: lowercase, spaces to
/// underscores, Spanish accented characters folded to ASCII.
pub fn parameter_slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' => '_',
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            'ü' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}
