use sqlx::SqlitePool;
use tracing::{debug, info, instrument};

use crate::db::{DbError, Parameter};

#[derive(Clone)]
pub struct ParameterRepository {
    pool: SqlitePool,
}

impl ParameterRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn find_all_ordered(&self) -> Result<Vec<Parameter>, DbError> {
        debug!("Querying all parameters");

        let parameters = sqlx::query_as::<_, Parameter>(
            r#"
            SELECT id_parametro, nombre_parametro, unidad_medida,
                   valor_limite_permisible, tipo_matriz, descripcion
            FROM parametros_ambientales
            ORDER BY nombre_parametro
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!("Found {} parameters", parameters.len());
        Ok(parameters)
    }

    /// Case-insensitive substring match on the parameter name.
    ///
    /// Names are not unique; the first match (lowest id) wins, so ambiguous
    /// fragments can resolve to the wrong row. Callers go through
    /// `services::NameResolver`, the single seam where this lives.
    #[instrument(skip(self), fields(fragment = %fragment))]
    pub async fn find_by_name_fragment(&self, fragment: &str) -> Result<Option<Parameter>, DbError> {
        let parameter = sqlx::query_as::<_, Parameter>(
            r#"
            SELECT id_parametro, nombre_parametro, unidad_medida,
                   valor_limite_permisible, tipo_matriz, descripcion
            FROM parametros_ambientales
            WHERE LOWER(nombre_parametro) LIKE '%' || LOWER(?1) || '%'
            ORDER BY id_parametro
            LIMIT 1
            "#,
        )
        .bind(fragment)
        .fetch_optional(&self.pool)
        .await?;

        if parameter.is_some() {
            debug!("Parameter fragment matched");
        } else {
            debug!("No parameter matches fragment");
        }

        Ok(parameter)
    }

    #[instrument(skip(self), fields(nombre = %nombre))]
    pub async fn insert(
        &self,
        nombre: &str,
        unidad: &str,
        limite: f64,
        tipo_matriz: Option<&str>,
        descripcion: Option<&str>,
    ) -> Result<i64, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO parametros_ambientales
                (nombre_parametro, unidad_medida, valor_limite_permisible, tipo_matriz, descripcion)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(nombre)
        .bind(unidad)
        .bind(limite)
        .bind(tipo_matriz)
        .bind(descripcion)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!("Inserted parameter {} with id {}", nombre, id);
        Ok(id)
    }

    #[instrument(skip(self))]
    pub async fn count(&self) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM parametros_ambientales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
