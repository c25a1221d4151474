//! Application services wiring the domain to the ports

pub mod classifier;
pub mod ingest;

pub use classifier::{Classification, SoilClassifier};
pub use ingest::{CycleOutcome, IngestError, IngestService};
