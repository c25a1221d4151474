//! Payload validation
//!
//! A structured payload is trusted only if every required field is present,
//! numeric, and temperature and moisture fall within their physical ranges.
//! A rejected payload is dropped whole: nothing downstream sees it.

use core::ops::RangeInclusive;

use serde_json::{Map, Value};
use thiserror::Error;

use super::reading::SensorFrame;
use crate::ingest_protocol::REQUIRED_FIELDS;

/// Accepted soil temperature range (Celsius)
pub const TEMPERATURE_RANGE: RangeInclusive<f64> = -40.0..=100.0;

/// Accepted moisture range (percent)
pub const MOISTURE_RANGE: RangeInclusive<f64> = 0.0..=100.0;

/// Reason a payload was rejected
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("field {0} is not numeric")]
    NotNumeric(&'static str),
    #[error("temperature {0} out of range")]
    TemperatureOutOfRange(f64),
    #[error("moisture {0} out of range")]
    MoistureOutOfRange(f64),
}

/// Validate a parsed payload and extract its sensor values
pub fn validate_payload(payload: &Map<String, Value>) -> Result<SensorFrame, ValidationError> {
    for field in REQUIRED_FIELDS {
        if !payload.contains_key(field) {
            return Err(ValidationError::MissingField(field));
        }
    }

    let temperature = numeric(payload, "temperature")?;
    let moisture = numeric(payload, "moisture")?;
    let n_value = numeric(payload, "n_value")?;
    let p_value = numeric(payload, "p_value")?;
    let k_value = numeric(payload, "k_value")?;

    if !TEMPERATURE_RANGE.contains(&temperature) {
        return Err(ValidationError::TemperatureOutOfRange(temperature));
    }
    if !MOISTURE_RANGE.contains(&moisture) {
        return Err(ValidationError::MoistureOutOfRange(moisture));
    }

    Ok(SensorFrame::new(temperature, moisture, n_value, p_value, k_value))
}

/// Accept/reject form of [`validate_payload`]
pub fn is_valid(payload: &Map<String, Value>) -> bool {
    validate_payload(payload).is_ok()
}

fn numeric(payload: &Map<String, Value>, field: &'static str) -> Result<f64, ValidationError> {
    payload
        .get(field)
        .and_then(Value::as_f64)
        .ok_or(ValidationError::NotNumeric(field))
}
