//! Adapters - concrete implementations of ports
//!
//! # Available Adapters
//!
//! - **serial**: sensor board over a serial port (`serialport` crate)
//! - **model_artifacts**: nearest-centroid classifier and label encoder
//!   stored as postcard files

pub mod model_artifacts;
pub mod serial;

pub use model_artifacts::{LabelEncoder, ModelBundle, ModelSource, NearestCentroidModel};
pub use serial::SerialLinkAdapter;
