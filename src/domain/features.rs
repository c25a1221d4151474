//! Classifier feature vector
//!
//! Layout (index: meaning):
//! - 0: temperature
//! - 1: moisture
//! - 2: acidity (placeholder, not measured by the board)
//! - 3: nitrogen
//! - 4: phosphorus
//! - 5: potassium
//! - 6: drainage rate (placeholder, not measured by the board)
//! - 7: texture code

use serde::{Deserialize, Serialize};

use super::preference::UserPreference;
use super::reading::SensorFrame;

/// Number of features the classifier consumes
pub const FEATURE_COUNT: usize = 8;

/// Acidity fed to the classifier until the board has a pH probe
pub const PH_PLACEHOLDER: f64 = 6.5;

/// Drainage rate fed to the classifier until it is measured
pub const DRAINAGE_PLACEHOLDER: f64 = 0.5;

/// Ordered classifier input
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Build the vector for a frame under the given preference
    pub fn build(frame: &SensorFrame, preference: &UserPreference) -> Self {
        Self([
            frame.temperature,
            frame.moisture,
            PH_PLACEHOLDER,
            frame.n_value,
            frame.p_value,
            frame.k_value,
            DRAINAGE_PLACEHOLDER,
            f64::from(preference.texture_code()),
        ])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn texture_code(&self) -> f64 {
        self.0[7]
    }

    /// True if every feature is a finite number
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}
