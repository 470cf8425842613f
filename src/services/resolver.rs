use tracing::{info, instrument};

use crate::db::{DbError, ParameterRepository, StationRepository};

/// Name-based station/parameter resolution for batch ingestion.
///
/// All fuzzy find-or-create behavior lives behind this one seam: station
/// fallback creation and case-insensitive substring parameter matching.
/// Swapping to exact-match-by-slug would touch only this module.
///
/// Two concurrent batches naming a brand-new parameter can both miss the
/// lookup and insert duplicate rows; accepted at this system's scale.
#[derive(Clone)]
pub struct NameResolver {
    stations: StationRepository,
    parameters: ParameterRepository,
}

impl NameResolver {
    pub fn new(stations: StationRepository, parameters: ParameterRepository) -> Self {
        Self {
            stations,
            parameters,
        }
    }

    /// The station batch readings are attributed to: first active station by
    /// id, or a freshly created remote default when none is active.
    #[instrument(skip(self))]
    pub async fn default_station_id(&self) -> Result<i64, DbError> {
        if let Some(station) = self.stations.find_first_active().await? {
            return Ok(station.id_estacion);
        }

        info!("No active station found, creating batch default station");
        self.stations
            .insert("Estación API", None, None, Some("Remoto"), "activa")
            .await
    }

    /// Resolve a parameter by name fragment, creating it with an inferred
    /// unit and permissible limit when nothing matches.
    #[instrument(skip(self), fields(raw_name = %raw_name))]
    pub async fn resolve_or_create_parameter(&self, raw_name: &str) -> Result<i64, DbError> {
        if let Some(parameter) = self.parameters.find_by_name_fragment(raw_name).await? {
            return Ok(parameter.id_parametro);
        }

        let unidad = infer_unit(raw_name);
        let limite = infer_limit(raw_name);
        let nombre = title_case(raw_name);
        info!(
            "Creating parameter {} (unit {}, limit {})",
            nombre, unidad, limite
        );
        self.parameters
            .insert(&nombre, unidad, limite, None, None)
            .await
    }
}

/// Measurement unit inferred from keywords in the parameter name.
pub fn infer_unit(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    if lower.contains("temperatura") || lower.contains("temperature") {
        "°C"
    } else if lower.contains("humedad") || lower.contains("humidity") {
        "%"
    } else if lower.contains("presion") || lower.contains("pressure") {
        "hPa"
    } else if lower.contains("viento") || lower.contains("wind") {
        "m/s"
    } else if lower.contains("lluvia")
        || lower.contains("precipitacion")
        || lower.contains("rain")
    {
        "mm"
    } else {
        "unidad"
    }
}

/// Permissible limit inferred from keywords in the parameter name.
pub fn infer_limit(name: &str) -> f64 {
    let lower = name.to_lowercase();
    if lower.contains("temperatura") || lower.contains("temperature") {
        35.0
    } else if lower.contains("humedad") || lower.contains("humidity") {
        85.0
    } else if lower.contains("presion") || lower.contains("pressure") {
        1020.0
    } else {
        100.0
    }
}

/// Title-case a raw parameter key for display ("oxigeno disuelto" ->
/// "Oxigeno Disuelto").
pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_units_from_keywords() {
        assert_eq!(infer_unit("temperatura ambiente"), "°C");
        assert_eq!(infer_unit("Temperature"), "°C");
        assert_eq!(infer_unit("humedad relativa"), "%");
        assert_eq!(infer_unit("presion atmosferica"), "hPa");
        assert_eq!(infer_unit("viento"), "m/s");
        assert_eq!(infer_unit("lluvia acumulada"), "mm");
        assert_eq!(infer_unit("rain"), "mm");
        assert_eq!(infer_unit("turbidez"), "unidad");
    }

    #[test]
    fn infers_limits_from_keywords() {
        assert_eq!(infer_limit("temperatura"), 35.0);
        assert_eq!(infer_limit("humidity"), 85.0);
        assert_eq!(infer_limit("presion"), 1020.0);
        assert_eq!(infer_limit("viento"), 100.0);
        assert_eq!(infer_limit("turbidez"), 100.0);
    }

    #[test]
    fn title_cases_parameter_names() {
        assert_eq!(title_case("temperatura"), "Temperatura");
        assert_eq!(title_case("oxigeno disuelto"), "Oxigeno Disuelto");
        assert_eq!(title_case("PH"), "Ph");
        assert_eq!(title_case(""), "");
    }
}
