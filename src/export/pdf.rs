use chrono::Utc;
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{BuiltinFont, Color, Mm, PdfDocument, Point, Polygon, Rgb};
use tracing::{debug, instrument};

use crate::db::DatasetRow;
use crate::export::{format_number, ExportError};

/// The PDF table shows at most this many rows; anything beyond is counted
/// in the omission footnote.
pub const TABLE_LIMIT: usize = 50;

const TITLE: &str = "Reporte de Monitoreo Ambiental";
const TABLE_HEADERS: [&str; 5] = ["Fecha", "Estación", "Parámetro", "Valor", "Estado"];

/// Textual summary printed above the table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    pub total: usize,
    pub exceeding: usize,
    pub compliance_pct: f64,
}

/// Count rows and exceedances and derive the compliance percentage.
/// Division is guarded so an empty dataset yields 0.0 instead of a fault.
pub fn summarize(rows: &[DatasetRow]) -> ReportSummary {
    let total = rows.len();
    let exceeding = rows.iter().filter(|r| r.estado == "Excede límite").count();
    let compliance_pct = if total == 0 {
        0.0
    } else {
        (total - exceeding) as f64 * 100.0 / total as f64
    };

    ReportSummary {
        total,
        exceeding,
        compliance_pct,
    }
}

/// Table cells for the first [`TABLE_LIMIT`] rows: Fecha, Estación and
/// Parámetro truncated to 16/15/12 characters, Valor and Unidad
/// concatenated, plus the derived state.
pub fn table_cells(rows: &[DatasetRow]) -> Vec<[String; 5]> {
    rows.iter()
        .take(TABLE_LIMIT)
        .map(|row| {
            [
                truncate(&row.fecha, 16),
                truncate(&row.estacion, 15),
                truncate(&row.parametro, 12),
                format!("{} {}", format_number(row.valor), row.unidad),
                row.estado.clone(),
            ]
        })
        .collect()
}

/// Omission footnote for datasets larger than the table limit.
pub fn footnote(total: usize) -> Option<String> {
    if total > TABLE_LIMIT {
        Some(format!(
            "Mostrando los primeros {} registros de {} totales ({} omitidos)",
            TABLE_LIMIT,
            total,
            total - TABLE_LIMIT
        ))
    } else {
        None
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Render the full projection as a one-page A4 report: title block,
/// generation timestamp, summary, and the truncated table under a colored
/// header band. An empty dataset renders an explicit no-data notice.
#[instrument(skip(rows), fields(count = rows.len()))]
pub fn render(rows: &[DatasetRow]) -> Result<Vec<u8>, ExportError> {
    let (doc, page, layer) = PdfDocument::new(TITLE, Mm(210.0), Mm(297.0), "Capa 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    let layer = doc.get_page(page).get_layer(layer);

    layer.use_text(TITLE, 16.0, Mm(20.0), Mm(275.0), &bold);
    layer.use_text(
        format!("Generado: {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC")),
        10.0,
        Mm(20.0),
        Mm(267.0),
        &font,
    );

    let summary = summarize(rows);
    layer.use_text(
        format!("Total de registros: {}", summary.total),
        10.0,
        Mm(20.0),
        Mm(257.0),
        &font,
    );
    layer.use_text(
        format!("Registros que exceden el límite: {}", summary.exceeding),
        10.0,
        Mm(20.0),
        Mm(251.0),
        &font,
    );
    layer.use_text(
        format!("Cumplimiento: {:.1}%", summary.compliance_pct),
        10.0,
        Mm(20.0),
        Mm(245.0),
        &font,
    );

    if rows.is_empty() {
        layer.use_text("No hay datos disponibles", 12.0, Mm(20.0), Mm(228.0), &font);
        return doc
            .save_to_bytes()
            .map_err(|e| ExportError::Pdf(e.to_string()));
    }

    let column_x = [20.0, 58.0, 96.0, 128.0, 168.0];

    // Header band with white captions
    layer.set_fill_color(Color::Rgb(Rgb::new(0.16, 0.32, 0.48, None)));
    layer.add_polygon(header_band());
    layer.set_fill_color(Color::Rgb(Rgb::new(1.0, 1.0, 1.0, None)));
    for (x, caption) in column_x.iter().zip(TABLE_HEADERS) {
        layer.use_text(caption, 9.0, Mm(*x), Mm(231.5), &bold);
    }

    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    let mut y = 224.0;
    for cells in table_cells(rows) {
        for (x, cell) in column_x.iter().zip(cells) {
            layer.use_text(cell, 8.0, Mm(*x), Mm(y), &font);
        }
        y -= 3.8;
    }

    if let Some(note) = footnote(rows.len()) {
        layer.use_text(note, 9.0, Mm(20.0), Mm(y - 5.0), &font);
    }

    let bytes = doc
        .save_to_bytes()
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    debug!("Rendered {} PDF bytes", bytes.len());
    Ok(bytes)
}

fn header_band() -> Polygon {
    let corners = vec![
        (Point::new(Mm(18.0), Mm(229.0)), false),
        (Point::new(Mm(192.0), Mm(229.0)), false),
        (Point::new(Mm(192.0), Mm(236.0)), false),
        (Point::new(Mm(18.0), Mm(236.0)), false),
    ];

    Polygon {
        rings: vec![corners],
        mode: PaintMode::Fill,
        winding_order: WindingOrder::NonZero,
    }
}
