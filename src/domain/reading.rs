//! Sensor reading domain entities
//!
//! `SensorFrame` is the transient, validated content of one structured
//! payload. `ProcessedReading` is the immutable record built from it once
//! the soil type and recommendation are known.

use core::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::preference::UserPreference;

/// Device identifier reported for readings from the attached board
pub const DEFAULT_DEVICE_ID: &str = "ESP32_SoilSense_01";

/// Validated sensor values from one structured payload
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorFrame {
    /// Soil temperature in Celsius
    pub temperature: f64,
    /// Volumetric moisture, percent (0-100)
    pub moisture: f64,
    /// Nitrogen
    pub n_value: f64,
    /// Phosphorus
    pub p_value: f64,
    /// Potassium
    pub k_value: f64,
}

impl SensorFrame {
    pub const fn new(temperature: f64, moisture: f64, n_value: f64, p_value: f64, k_value: f64) -> Self {
        Self {
            temperature,
            moisture,
            n_value,
            p_value,
            k_value,
        }
    }
}

/// A fully processed reading, as served by the query interface.
///
/// Built once per accepted frame and never mutated afterwards; a newer
/// reading replaces it wholesale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessedReading {
    pub device_id: String,
    /// Local wall-clock time the frame was processed
    pub timestamp: NaiveDateTime,
    pub soil_type: String,
    pub temperature: f64,
    pub moisture: f64,
    pub n_value: f64,
    pub p_value: f64,
    pub k_value: f64,
    pub user_texture: String,
    pub user_color: String,
    pub recommendation: String,
}

impl ProcessedReading {
    /// Assemble a reading from a validated frame and its derived fields
    pub fn new(
        device_id: impl Into<String>,
        timestamp: NaiveDateTime,
        frame: &SensorFrame,
        soil_type: impl Into<String>,
        preference: &UserPreference,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            timestamp,
            soil_type: soil_type.into(),
            temperature: frame.temperature,
            moisture: frame.moisture,
            n_value: frame.n_value,
            p_value: frame.p_value,
            k_value: frame.k_value,
            user_texture: preference.texture.clone(),
            user_color: preference.color.clone(),
            recommendation: recommendation.into(),
        }
    }

    /// The sensor values this reading was built from
    pub fn frame(&self) -> SensorFrame {
        SensorFrame::new(
            self.temperature,
            self.moisture,
            self.n_value,
            self.p_value,
            self.k_value,
        )
    }
}

impl fmt::Display for ProcessedReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:=<60}", "")?;
        writeln!(f, "SOIL SENSE - SENSOR READINGS")?;
        writeln!(f, "{:=<60}", "")?;
        writeln!(f, "Temperature: {:.1} C", self.temperature)?;
        writeln!(f, "Moisture:    {}%", self.moisture)?;
        writeln!(f, "N-P-K:       {}-{}-{}", self.n_value, self.p_value, self.k_value)?;
        writeln!(
            f,
            "User Input:  {} texture, {} color",
            self.user_texture, self.user_color
        )?;
        writeln!(f, "Prediction:  {} soil", self.soil_type)?;
        writeln!(f, "{:-<60}", "")?;
        writeln!(f, "RECOMMENDATION:")?;
        writeln!(f, "{}", self.recommendation)?;
        write!(f, "{:=<60}", "")
    }
}
