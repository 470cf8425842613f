//! Input validation for incoming measurement data.
//!
//! Every measurement value passes through [`validate_number`] before it is
//! persisted; this is the single gate protecting data quality.

/// Accepted range for environmental measurement values. A coarse sanity
/// bound, not a per-parameter physical constraint.
pub const VALUE_MIN: f64 = -100.0;
pub const VALUE_MAX: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("El campo {field} es obligatorio")]
    MissingField { field: String },
    #[error("{field} debe ser un número válido")]
    NotANumber { field: String },
    #[error("{field} fuera del rango válido (-100 a 1000)")]
    OutOfRange { field: String },
}

impl ValidationError {
    pub fn missing(field: &str) -> Self {
        Self::MissingField {
            field: field.to_string(),
        }
    }
}

/// Parse `raw` as a measurement value.
///
/// Fails if the input is not a finite number or lies outside
/// [`VALUE_MIN`, `VALUE_MAX`]. The error message names the offending field.
pub fn validate_number(raw: &str, field_name: &str) -> Result<f64, ValidationError> {
    let value: f64 = raw.trim().parse().map_err(|_| ValidationError::NotANumber {
        field: field_name.to_string(),
    })?;

    // "NaN"/"inf" parse successfully in Rust; both are out of range here
    if !value.is_finite() || value < VALUE_MIN || value > VALUE_MAX {
        return Err(ValidationError::OutOfRange {
            field: field_name.to_string(),
        });
    }

    Ok(value)
}
