//! Classifier artifacts
//!
//! Two files ship together: the classifier and the label encoder that maps
//! its class indices back to soil-type labels. Both are postcard-encoded.
//! When either fails to load, a fallback fitted on a single synthetic
//! sample is used so ingestion keeps running.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{FeatureVector, FEATURE_COUNT};
use crate::ports::model::{ModelError, SoilModel};

/// Synthetic sample the fallback model is fitted on
pub const FALLBACK_SAMPLE: [f64; FEATURE_COUNT] = [28.0, 45.0, 6.5, 40.0, 25.0, 30.0, 0.8, 3.0];

/// Label of the fallback sample
pub const FALLBACK_LABEL: &str = "Loamy";

/// Nearest-centroid classifier over the soil feature vector
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NearestCentroidModel {
    /// One centroid per class index
    centroids: Vec<[f64; FEATURE_COUNT]>,
}

impl NearestCentroidModel {
    /// Fit one centroid per class as the mean of its samples
    ///
    /// Class indices must be dense (`0..n`), as produced by
    /// [`LabelEncoder::fit_transform`].
    pub fn fit(samples: &[[f64; FEATURE_COUNT]], classes: &[usize]) -> Result<Self, ModelError> {
        if samples.is_empty() {
            return Err(ModelError::InvalidTrainingData("no samples"));
        }
        if samples.len() != classes.len() {
            return Err(ModelError::InvalidTrainingData("sample/class count differ"));
        }

        let class_count = classes.iter().max().map_or(0, |m| m + 1);
        let mut sums = vec![[0.0; FEATURE_COUNT]; class_count];
        let mut counts = vec![0usize; class_count];

        for (sample, &class) in samples.iter().zip(classes) {
            if sample.iter().any(|v| !v.is_finite()) {
                return Err(ModelError::NonFiniteFeature);
            }
            for (acc, v) in sums[class].iter_mut().zip(sample) {
                *acc += v;
            }
            counts[class] += 1;
        }

        if counts.contains(&0) {
            return Err(ModelError::InvalidTrainingData("class indices are not dense"));
        }

        let centroids = sums
            .into_iter()
            .zip(counts)
            .map(|(mut sum, n)| {
                for v in sum.iter_mut() {
                    *v /= n as f64;
                }
                sum
            })
            .collect();

        Ok(Self { centroids })
    }

    pub fn centroids(&self) -> &[[f64; FEATURE_COUNT]] {
        &self.centroids
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = fs::read(path)?;
        Ok(postcard::from_bytes(&bytes)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        fs::write(path, postcard::to_allocvec(self)?)?;
        Ok(())
    }
}

impl SoilModel for NearestCentroidModel {
    fn predict(&self, features: &FeatureVector) -> Result<usize, ModelError> {
        if !features.is_finite() {
            return Err(ModelError::NonFiniteFeature);
        }

        let mut best: Option<(usize, f64)> = None;
        for (class, centroid) in self.centroids.iter().enumerate() {
            let distance: f64 = centroid
                .iter()
                .zip(features.as_slice())
                .map(|(c, x)| (c - x) * (c - x))
                .sum();
            // Strict comparison keeps the lower index on ties
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((class, distance));
            }
        }

        best.map(|(class, _)| class).ok_or(ModelError::NotFitted)
    }

    fn class_count(&self) -> usize {
        self.centroids.len()
    }
}

/// Maps soil-type labels to dense class indices and back
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    /// Sorted, unique labels; the position is the class index
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Learn the label set and encode the given labels
    pub fn fit_transform<S: AsRef<str>>(labels: &[S]) -> (Self, Vec<usize>) {
        let mut classes: Vec<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();

        let encoder = Self { classes };
        let encoded = labels
            .iter()
            .map(|l| encoder.transform(l.as_ref()).unwrap_or_default())
            .collect();
        (encoder, encoded)
    }

    /// Class index of a known label
    pub fn transform(&self, label: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(label)).ok()
    }

    /// Label of a class index
    pub fn inverse_transform(&self, class: usize) -> Result<&str, ModelError> {
        self.classes
            .get(class)
            .map(String::as_str)
            .ok_or(ModelError::UnknownClass(class))
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = fs::read(path)?;
        Ok(postcard::from_bytes(&bytes)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        fs::write(path, postcard::to_allocvec(self)?)?;
        Ok(())
    }
}

/// Where the loaded classifier came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelSource {
    /// Read from the artifact files
    Artifacts,
    /// Fitted in memory after the artifacts failed to load
    Fallback,
}

impl ModelSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ModelSource::Artifacts => "artifacts",
            ModelSource::Fallback => "fallback",
        }
    }
}

/// Classifier and label encoder, loaded together
#[derive(Clone, Debug)]
pub struct ModelBundle {
    pub model: NearestCentroidModel,
    pub encoder: LabelEncoder,
    pub source: ModelSource,
}

impl ModelBundle {
    /// Load both artifacts
    pub fn load(model_path: &Path, encoder_path: &Path) -> Result<Self, ModelError> {
        let model = NearestCentroidModel::load(model_path)?;
        let encoder = LabelEncoder::load(encoder_path)?;
        Ok(Self {
            model,
            encoder,
            source: ModelSource::Artifacts,
        })
    }

    /// Model fitted on the single synthetic sample
    pub fn fallback() -> Result<Self, ModelError> {
        let (encoder, classes) = LabelEncoder::fit_transform(&[FALLBACK_LABEL]);
        let model = NearestCentroidModel::fit(&[FALLBACK_SAMPLE], &classes)?;
        Ok(Self {
            model,
            encoder,
            source: ModelSource::Fallback,
        })
    }

    /// Load the artifacts, or fit the fallback if that fails
    pub fn load_or_fallback(model_path: &Path, encoder_path: &Path) -> Result<Self, ModelError> {
        match Self::load(model_path, encoder_path) {
            Ok(bundle) => {
                info!(model = %model_path.display(), classes = bundle.encoder.classes().len(), "ML model loaded");
                Ok(bundle)
            }
            Err(e) => {
                warn!("Model load failed: {}. Using fallback model.", e);
                Self::fallback()
            }
        }
    }

    /// Write both artifacts
    pub fn save(&self, model_path: &Path, encoder_path: &Path) -> Result<(), ModelError> {
        self.model.save(model_path)?;
        self.encoder.save(encoder_path)
    }
}
