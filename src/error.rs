//! Crate-level error type

use thiserror::Error;

use crate::ports::{LinkError, ModelError};

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Every connection attempt failed
    #[error("could not connect to {port} after {attempts} attempts")]
    ConnectionUnavailable { port: String, attempts: u32 },
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("ingest worker panicked")]
    WorkerPanicked,
}
