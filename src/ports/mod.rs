//! Ports (interfaces) defining the boundaries of the application
//!
//! - **SensorLink**: how telemetry lines arrive (serial port, scripted mock)
//! - **SoilModel**: how a feature vector becomes a class index

pub mod link;
pub mod model;

pub use link::{LinkError, SensorLink};
pub use model::{ModelError, SoilModel};
