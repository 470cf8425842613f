use sqlx::SqlitePool;
use tracing::{debug, info, instrument};

use crate::db::{DbError, Station};

#[derive(Clone)]
pub struct StationRepository {
    pool: SqlitePool,
}

impl StationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Stations offered for form population (`estado` gates visibility).
    #[instrument(skip(self))]
    pub async fn find_active(&self) -> Result<Vec<Station>, DbError> {
        debug!("Querying active stations");

        let stations = sqlx::query_as::<_, Station>(
            r#"
            SELECT id_estacion, nombre_estacion, latitud, longitud,
                   tipo_estacion, fecha_instalacion, estado
            FROM estaciones_monitoreo
            WHERE estado = 'activa'
            ORDER BY id_estacion
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!("Found {} active stations", stations.len());
        Ok(stations)
    }

    /// First active station by id, the batch API's default attribution target.
    #[instrument(skip(self))]
    pub async fn find_first_active(&self) -> Result<Option<Station>, DbError> {
        let station = sqlx::query_as::<_, Station>(
            r#"
            SELECT id_estacion, nombre_estacion, latitud, longitud,
                   tipo_estacion, fecha_instalacion, estado
            FROM estaciones_monitoreo
            WHERE estado = 'activa'
            ORDER BY id_estacion
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(station)
    }

    #[instrument(skip(self), fields(nombre = %nombre))]
    pub async fn insert(
        &self,
        nombre: &str,
        latitud: Option<f64>,
        longitud: Option<f64>,
        tipo_estacion: Option<&str>,
        estado: &str,
    ) -> Result<i64, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO estaciones_monitoreo
                (nombre_estacion, latitud, longitud, tipo_estacion, estado)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(nombre)
        .bind(latitud)
        .bind(longitud)
        .bind(tipo_estacion)
        .bind(estado)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!("Inserted station {} with id {}", nombre, id);
        Ok(id)
    }

    #[instrument(skip(self))]
    pub async fn count(&self) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM estaciones_monitoreo")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    #[instrument(skip(self))]
    pub async fn count_active(&self) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM estaciones_monitoreo WHERE estado = 'activa'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
