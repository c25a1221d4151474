//! SoilSense host library
//!
//! Reads soil telemetry (temperature, moisture, N-P-K) from a sensor board
//! over a serial link, classifies the soil type and derives an irrigation
//! and crop recommendation. The latest processed reading is served over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                                 │
//! │  - SensorFrame / ProcessedReading entities                       │
//! │  - UserPreference (texture code lookup)                          │
//! │  - Validator, feature vector, recommendation engine              │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Ports (Traits)                               │
//! │  - SensorLink: polled line-oriented device link                  │
//! │  - SoilModel: feature vector -> class index                      │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Adapters                                     │
//! │  - SerialLinkAdapter: serialport-backed link + connect retry     │
//! │  - NearestCentroidModel / LabelEncoder: postcard artifacts       │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Services                                     │
//! │  - SoilClassifier: model + encoder with texture fallback         │
//! │  - IngestService: frame reader loop and processing pipeline      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Data flow
//!
//! ```text
//! SerialLinkAdapter -> ingest_protocol::classify_line -> domain::validate_payload
//!     -> SoilClassifier -> domain::recommend -> SharedState (latest reading)
//! ```
//!
//! The ingest loop is the only writer of the latest-reading slot; the HTTP
//! layer is the only writer of the preference slot. Both slots are replaced
//! as whole values so readers never observe a half-updated record.

#![forbid(unsafe_code)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod ingest_protocol;
pub mod ports;
pub mod services;
pub mod state;

pub use adapters::{LabelEncoder, ModelBundle, ModelSource, NearestCentroidModel, SerialLinkAdapter};
pub use config::{HostConfig, IngestConfig, ModelConfig, SerialConfig, ServerConfig};
pub use domain::{FeatureVector, ProcessedReading, SensorFrame, UserPreference};
pub use error::{Error, Result};
pub use ingest_protocol::{Frame, FrameError};
pub use ports::{LinkError, ModelError, SensorLink, SoilModel};
pub use services::{CycleOutcome, IngestError, IngestService, SoilClassifier};
pub use state::{IngestStats, SharedState, StatsSnapshot};
