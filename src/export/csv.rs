use tracing::{debug, instrument};

use crate::db::DatasetRow;
use crate::export::{format_number, ExportError, COLUMNS};

/// One CSV record in column order, as text cells.
pub fn record(row: &DatasetRow) -> [String; 10] {
    [
        row.fecha.clone(),
        row.estacion.clone(),
        row.parametro.clone(),
        format_number(row.valor),
        row.unidad.clone(),
        format_number(row.limite),
        row.responsable.clone(),
        row.condiciones.clone(),
        row.observaciones.clone(),
        row.estado.clone(),
    ]
}

/// Render the full projection as UTF-8 CSV with a header row.
#[instrument(skip(rows), fields(count = rows.len()))]
pub fn render(rows: &[DatasetRow]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(COLUMNS)?;
    for row in rows {
        writer.write_record(record(row))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))?;
    debug!("Rendered {} CSV bytes", bytes.len());
    Ok(bytes)
}
