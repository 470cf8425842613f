use crate::db::DbError;
use crate::validation::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("No hay datos para exportar")]
    NoData,
    #[error(transparent)]
    Db(#[from] DbError),
}
