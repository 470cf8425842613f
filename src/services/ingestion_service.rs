use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::db::{MeasurementRepository, NewMeasurement};
use crate::services::{NameResolver, ServiceError};
use crate::validation::{validate_number, ValidationError};

/// Keys of a batch payload that are metadata, not parameter readings.
const RESERVED_KEYS: [&str; 2] = ["observaciones", "timestamp"];

/// The operator-facing entry form. Every field arrives optional so that
/// missing-field errors surface as user messages, not request rejections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeasurementForm {
    pub estacion: Option<String>,
    pub parametro: Option<String>,
    pub valor: Option<String>,
    pub responsable: Option<String>,
    pub condiciones: Option<String>,
    pub observaciones: Option<String>,
}

#[derive(Clone)]
pub struct IngestionService {
    measurements: MeasurementRepository,
    resolver: NameResolver,
}

impl IngestionService {
    pub fn new(measurements: MeasurementRepository, resolver: NameResolver) -> Self {
        Self {
            measurements,
            resolver,
        }
    }

    /// Insert a single operator-submitted measurement.
    ///
    /// All-or-nothing: any missing required field or invalid value fails
    /// before anything is written. Returns the new row id.
    #[instrument(skip(self, form))]
    pub async fn add_form_measurement(&self, form: &MeasurementForm) -> Result<i64, ServiceError> {
        let estacion = required(&form.estacion, "estacion")?;
        let parametro = required(&form.parametro, "parametro")?;
        let valor = required(&form.valor, "valor")?;
        let responsable = required(&form.responsable, "responsable")?;

        let valor_medido = validate_number(valor, "Valor de medición")?;
        let id_estacion: i64 = estacion.trim().parse().map_err(|_| {
            ValidationError::NotANumber {
                field: "estacion".to_string(),
            }
        })?;
        let id_parametro: i64 = parametro.trim().parse().map_err(|_| {
            ValidationError::NotANumber {
                field: "parametro".to_string(),
            }
        })?;

        let measurement = NewMeasurement {
            id_estacion,
            id_parametro,
            valor_medido,
            responsable_medicion: responsable.trim().to_string(),
            condiciones_climaticas: optional_text(&form.condiciones),
            observaciones: optional_text(&form.observaciones),
        };

        let id = self.measurements.insert(&measurement).await?;
        info!("Form measurement {} recorded (value {})", id, valor_medido);
        Ok(id)
    }

    /// Ingest a batch of parameter readings from a field device payload.
    ///
    /// Each non-reserved key is treated as a parameter name; invalid values
    /// are logged and skipped rather than failing the batch. Returns the
    /// number of measurements actually saved.
    #[instrument(skip(self, payload), fields(keys = payload.len()))]
    pub async fn ingest_batch(
        &self,
        payload: &serde_json::Map<String, Value>,
    ) -> Result<usize, ServiceError> {
        let id_estacion = self.resolver.default_station_id().await?;
        let observaciones = payload
            .get("observaciones")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        let mut saved = 0;
        for (key, value) in payload {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }

            let valor_medido = match validate_number(&raw_value(value), key) {
                Ok(v) => v,
                Err(e) => {
                    warn!("Skipping invalid batch value for {}: {}", key, e);
                    continue;
                }
            };

            let id_parametro = self.resolver.resolve_or_create_parameter(key).await?;

            let measurement = NewMeasurement {
                id_estacion,
                id_parametro,
                valor_medido,
                responsable_medicion: "Sistema Automático".to_string(),
                condiciones_climaticas: String::new(),
                observaciones: observaciones.clone(),
            };
            self.measurements.insert(&measurement).await?;

            saved += 1;
            info!("Saved batch reading {}: {}", key, valor_medido);
        }

        info!("Batch ingestion saved {} measurements", saved);
        Ok(saved)
    }
}

/// Optional free-text field: absent becomes the empty string, present is
/// stored verbatim. Mirrors how the batch path defaults `observaciones`.
fn optional_text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ValidationError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ValidationError::missing(field)),
    }
}

/// Render a JSON value the way the validator expects it: strings verbatim,
/// everything else via its JSON representation (so `40` and `"40"` both
/// validate, while `true` or nested objects fail numeric parsing).
fn raw_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
