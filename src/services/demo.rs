//! Demo-fallback datasets.
//!
//! When the store is empty, the snapshot and chart endpoints serve these
//! fabricated readings so dependent dashboards stay non-empty. This is an
//! explicit, named mode (toggled by `Config::demo_fallback`) so operators
//! and tests can tell real output from synthetic output.

use std::collections::BTreeMap;

use chrono::{Duration, Utc};

use crate::services::report_service::{ChartPoint, SnapshotEntry};

/// The single synthetic example reading for the latest-values snapshot.
pub fn snapshot() -> BTreeMap<String, SnapshotEntry> {
    let mut entries = BTreeMap::new();
    entries.insert(
        "temperatura".to_string(),
        SnapshotEntry {
            valor: 24.5,
            unidad: "°C".to_string(),
            fecha: Utc::now().to_rfc3339(),
            estacion: "Sistema de Ejemplo".to_string(),
            limite: 30.0,
            estado: "normal".to_string(),
        },
    );
    entries
}

/// Deterministic 7-day chart series, oldest day first.
///
/// Values follow `20 + 2i + (i % 3)` for day offset i = 0..6. Synthetic
/// points carry `cantidad: 0` to mark them as fabricated.
pub fn chart_series() -> Vec<ChartPoint> {
    (0..7)
        .map(|i| ChartPoint {
            fecha: (Utc::now() - Duration::days(6 - i))
                .format("%Y-%m-%d")
                .to_string(),
            valor: (20 + 2 * i + (i % 3)) as f64,
            cantidad: 0,
        })
        .collect()
}
