//! Model port - abstraction for the soil classifier
//!
//! A model maps a feature vector to an encoded class index; turning the
//! index back into a label is the job of the label encoder that ships with
//! the model artifact.

use thiserror::Error;

use crate::domain::FeatureVector;

/// Error type for model loading and inference
#[derive(Debug, Error)]
pub enum ModelError {
    /// Feature vector contains NaN or infinity
    #[error("feature vector contains non-finite values")]
    NonFiniteFeature,
    /// Model has no classes to predict
    #[error("model has not been fitted")]
    NotFitted,
    /// Training input is inconsistent
    #[error("training data mismatch: {0}")]
    InvalidTrainingData(&'static str),
    /// Class index has no label
    #[error("unknown class index {0}")]
    UnknownClass(usize),
    /// Artifact file could not be read or written
    #[error("artifact i/o: {0}")]
    Io(#[from] std::io::Error),
    /// Artifact bytes could not be (de)serialized
    #[error("artifact encoding: {0}")]
    Encoding(#[from] postcard::Error),
}

/// Port for a pre-trained soil classifier
pub trait SoilModel: Send + Sync {
    /// Predict the encoded class index for one feature vector
    fn predict(&self, features: &FeatureVector) -> Result<usize, ModelError>;

    /// Number of classes the model can emit
    fn class_count(&self) -> usize;
}
