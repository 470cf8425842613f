//! Export formatters for the complete measurement dataset.
//!
//! All three renderers consume the same full-projection rows
//! ([`crate::db::DatasetRow`]) unmodified, so the numbers a CSV download
//! shows are the numbers the spreadsheet and the PDF show.

pub mod csv;
pub mod pdf;
pub mod spreadsheet;

use chrono::Utc;

/// Column captions shared by the CSV and spreadsheet renderers, in
/// projection order.
pub const COLUMNS: [&str; 10] = [
    "Fecha",
    "Estación",
    "Parámetro",
    "Valor",
    "Unidad",
    "Límite",
    "Responsable",
    "Condiciones",
    "Observaciones",
    "Estado",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV rendering failed: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("CSV buffer error: {0}")]
    Buffer(String),
    #[error("Spreadsheet rendering failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("PDF rendering failed: {0}")]
    Pdf(String),
}

/// Download filename stamped with the generation time, e.g.
/// `monitoreo_ambiental_20250301_120000.csv`.
pub fn attachment_filename(extension: &str) -> String {
    format!(
        "monitoreo_ambiental_{}.{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        extension
    )
}

/// Numeric cell text shared by the CSV and PDF renderers, so both formats
/// print identical values.
pub fn format_number(value: f64) -> String {
    value.to_string()
}
