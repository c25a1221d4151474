//! Domain layer - pure soil logic independent of infrastructure
//!
//! Nothing here touches the serial port, the model files or HTTP.

pub mod features;
pub mod preference;
pub mod reading;
pub mod recommendation;
pub mod validation;

pub use features::{FeatureVector, DRAINAGE_PLACEHOLDER, FEATURE_COUNT, PH_PLACEHOLDER};
pub use preference::{texture_code, UserPreference, COLOR_OPTIONS, TEXTURE_OPTIONS};
pub use reading::{ProcessedReading, SensorFrame, DEFAULT_DEVICE_ID};
pub use recommendation::{recommend, MoistureUrgency};
pub use validation::{is_valid, validate_payload, ValidationError};
