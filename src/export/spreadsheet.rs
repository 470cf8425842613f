use rust_xlsxwriter::{Format, Workbook};
use tracing::{debug, instrument};

use crate::db::DatasetRow;
use crate::export::{csv, ExportError, COLUMNS};

const SHEET_NAME: &str = "Monitoreo Ambiental";
const MAX_COLUMN_WIDTH: usize = 50;

/// Render the full projection as a single-sheet XLSX workbook.
#[instrument(skip(rows), fields(count = rows.len()))]
pub fn render(rows: &[DatasetRow]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, caption) in COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *caption, &header_format)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet.write_string(r, 0, &row.fecha)?;
        worksheet.write_string(r, 1, &row.estacion)?;
        worksheet.write_string(r, 2, &row.parametro)?;
        worksheet.write_number(r, 3, row.valor)?;
        worksheet.write_string(r, 4, &row.unidad)?;
        worksheet.write_number(r, 5, row.limite)?;
        worksheet.write_string(r, 6, &row.responsable)?;
        worksheet.write_string(r, 7, &row.condiciones)?;
        worksheet.write_string(r, 8, &row.observaciones)?;
        worksheet.write_string(r, 9, &row.estado)?;
    }

    for (col, width) in column_widths(rows).into_iter().enumerate() {
        worksheet.set_column_width(col as u16, width)?;
    }

    let bytes = workbook.save_to_buffer()?;
    debug!("Rendered {} XLSX bytes", bytes.len());
    Ok(bytes)
}

/// Column width = longest cell (header included) + 2, capped at 50.
pub fn column_widths(rows: &[DatasetRow]) -> [f64; 10] {
    let mut widths = COLUMNS.map(|caption| caption.chars().count());

    for row in rows {
        for (i, cell) in csv::record(row).iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    widths.map(|w| (w + 2).min(MAX_COLUMN_WIDTH) as f64)
}
