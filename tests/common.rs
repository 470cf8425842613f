// Shared fixtures for integration tests: a fresh in-memory SQLite store per
// test and the fully wired axum router on top of it.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use port_monitor_service::api::{create_router, AppState};
use port_monitor_service::db::{MeasurementRepository, ParameterRepository, StationRepository};
use port_monitor_service::services::{IngestionService, NameResolver, ReportService};

/// Open a fresh in-memory database and run migrations.
///
/// A single connection keeps the in-memory store alive for the whole test.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// Wire the full application router over the given pool.
pub fn build_app(pool: SqlitePool, demo_fallback: bool) -> axum::Router {
    let station_repo = StationRepository::new(pool.clone());
    let parameter_repo = ParameterRepository::new(pool.clone());
    let measurement_repo = MeasurementRepository::new(pool.clone());

    let resolver = NameResolver::new(station_repo.clone(), parameter_repo.clone());
    let ingestion_service = IngestionService::new(measurement_repo.clone(), resolver);
    let report_service = ReportService::new(
        measurement_repo,
        station_repo,
        parameter_repo,
        demo_fallback,
    );

    create_router(AppState {
        ingestion_service,
        report_service,
        pool,
    })
}

/// App over a fresh store, with the demo fallback switched off so tests see
/// real emptiness.
pub async fn test_app() -> (axum::Router, SqlitePool) {
    let pool = test_pool().await;
    let app = build_app(pool.clone(), false);
    (app, pool)
}

pub async fn insert_station(pool: &SqlitePool, nombre: &str, estado: &str) -> i64 {
    sqlx::query(
        "INSERT INTO estaciones_monitoreo (nombre_estacion, tipo_estacion, estado) VALUES (?1, 'agua', ?2)",
    )
    .bind(nombre)
    .bind(estado)
    .execute(pool)
    .await
    .expect("Failed to insert station")
    .last_insert_rowid()
}

pub async fn insert_parameter(pool: &SqlitePool, nombre: &str, unidad: &str, limite: f64) -> i64 {
    sqlx::query(
        "INSERT INTO parametros_ambientales (nombre_parametro, unidad_medida, valor_limite_permisible) VALUES (?1, ?2, ?3)",
    )
    .bind(nombre)
    .bind(unidad)
    .bind(limite)
    .execute(pool)
    .await
    .expect("Failed to insert parameter")
    .last_insert_rowid()
}

pub async fn insert_measurement(
    pool: &SqlitePool,
    id_estacion: i64,
    id_parametro: i64,
    valor: f64,
    fecha: &str,
) -> i64 {
    sqlx::query(
        r#"
        INSERT INTO mediciones
            (id_estacion, id_parametro, valor_medido, fecha_medicion,
             responsable_medicion, condiciones_climaticas, observaciones)
        VALUES (?1, ?2, ?3, ?4, 'Prueba', '', '')
        "#,
    )
    .bind(id_estacion)
    .bind(id_parametro)
    .bind(valor)
    .bind(fecha)
    .execute(pool)
    .await
    .expect("Failed to insert measurement")
    .last_insert_rowid()
}

/// Current UTC time in the store's timestamp format.
pub fn now_stamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
