//! Soil classification service
//!
//! Builds the feature vector for a frame, runs the model and decodes the
//! class index. Any inference or decoding failure degrades to the user's
//! own texture label instead of failing the frame.

use tracing::error;

use crate::adapters::{LabelEncoder, ModelBundle};
use crate::domain::{FeatureVector, SensorFrame, UserPreference};
use crate::ports::model::{ModelError, SoilModel};

/// Result of classifying one frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    pub soil_type: String,
    /// True if the soil type is the user texture rather than a prediction
    pub degraded: bool,
}

/// Soil classifier: model plus the label encoder paired with it
pub struct SoilClassifier {
    model: Box<dyn SoilModel>,
    encoder: LabelEncoder,
}

impl SoilClassifier {
    pub fn new(model: Box<dyn SoilModel>, encoder: LabelEncoder) -> Self {
        Self { model, encoder }
    }

    pub fn from_bundle(bundle: ModelBundle) -> Self {
        Self::new(Box::new(bundle.model), bundle.encoder)
    }

    /// Predict the soil-type label, propagating model errors
    pub fn predict(&self, features: &FeatureVector) -> Result<String, ModelError> {
        let class = self.model.predict(features)?;
        Ok(self.encoder.inverse_transform(class)?.to_string())
    }

    /// Classify a frame, falling back to the preference texture on error
    pub fn classify(&self, frame: &SensorFrame, preference: &UserPreference) -> Classification {
        let features = FeatureVector::build(frame, preference);
        match self.predict(&features) {
            Ok(soil_type) => Classification {
                soil_type,
                degraded: false,
            },
            Err(e) => {
                error!("Prediction failed: {}", e);
                Classification {
                    soil_type: preference.texture.clone(),
                    degraded: true,
                }
            }
        }
    }
}
