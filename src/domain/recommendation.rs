//! Recommendation engine
//!
//! Stateless mapping from (soil type, moisture, color) to advisory text:
//! a crop/irrigation base line, a color note and a moisture urgency tag.

/// Base advice for soil types without an entry
pub const GENERIC_ADVICE: &str = "Consult agricultural expert";

/// Moisture urgency, in decreasing order of severity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoistureUrgency {
    /// Below 20%
    Critical,
    /// Below 30%
    IrrigateNow,
    /// Dry for the given soil type
    Recommended,
    /// Nothing to flag
    None,
}

impl MoistureUrgency {
    /// Classify moisture for a soil type; the first matching threshold wins
    pub fn assess(soil_type: &str, moisture: f64) -> Self {
        if moisture < 20.0 {
            Self::Critical
        } else if moisture < 30.0 {
            Self::IrrigateNow
        } else if moisture < 50.0 && matches!(soil_type, "Sandy" | "Silty") {
            Self::Recommended
        } else if moisture < 60.0 && soil_type == "Clayey" {
            Self::Recommended
        } else {
            Self::None
        }
    }

    /// Text appended to the recommendation
    pub const fn suffix(&self) -> &'static str {
        match self {
            Self::Critical => " 🚨 CRITICAL - IRRIGATE IMMEDIATELY!",
            Self::IrrigateNow => " 🚨 IRRIGATE NOW!",
            Self::Recommended => " 💧 Irrigation recommended.",
            Self::None => "",
        }
    }
}

/// Crop and irrigation advice for a soil type
pub fn base_advice(soil_type: &str) -> &'static str {
    match soil_type {
        "Sandy" => "Sunflower/Millet. Good drainage, needs frequent irrigation.",
        "Loamy" => "Maize/Soybean. Balanced soil, moderate irrigation.",
        "Clayey" => "Rice/Spinach. Poor drainage, careful irrigation needed.",
        "Silty" => "Wheat/Barley. Fertile but may compact easily.",
        _ => GENERIC_ADVICE,
    }
}

/// Note for a user-reported soil color; empty for unknown colors
pub fn color_note(color: &str) -> &'static str {
    match color {
        "Brown" => "Good organic content.",
        "Black" => "High organic matter, very fertile.",
        "Red" => "Iron-rich soil, may need pH adjustment.",
        "Yellow" => "Possible drainage issues, may need improvement.",
        "White" => "May be saline or leached, test pH.",
        "Grey" => "Poor drainage, may need soil amendments.",
        _ => "",
    }
}

/// Full advisory string: base, color note, then urgency suffix
pub fn recommend(soil_type: &str, moisture: f64, color: &str) -> String {
    format!(
        "{} {}{}",
        base_advice(soil_type),
        color_note(color),
        MoistureUrgency::assess(soil_type, moisture).suffix()
    )
}
