//! Link port - abstraction for the device connection
//!
//! The ingest loop polls the link: it asks how many bytes are waiting and,
//! only if some are, reads one newline-terminated line.

use thiserror::Error;

/// Error type for link operations
#[derive(Debug, Error)]
pub enum LinkError {
    /// Could not open the device
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
    /// Device went away; the link cannot be used again
    #[error("device disconnected")]
    Disconnected,
    /// Transient read failure
    #[error("read failed: {0}")]
    Read(#[from] std::io::Error),
    /// Line exceeded the maximum frame length without a terminator
    #[error("line exceeds {0} bytes")]
    LineTooLong(usize),
}

impl LinkError {
    /// True if the link is gone and polling should stop
    pub fn is_fatal(&self) -> bool {
        matches!(self, LinkError::Disconnected)
    }
}

/// Port for a polled, line-oriented device link
///
/// # Example Implementation
///
/// ```ignore
/// struct ScriptedLink {
///     lines: VecDeque<String>,
/// }
///
/// impl SensorLink for ScriptedLink {
///     fn bytes_available(&mut self) -> Result<usize, LinkError> {
///         Ok(self.lines.front().map_or(0, |l| l.len()))
///     }
///
///     fn read_line(&mut self) -> Result<String, LinkError> {
///         self.lines.pop_front().ok_or(LinkError::Disconnected)
///     }
/// }
/// ```
pub trait SensorLink {
    /// Number of bytes waiting to be read (0 means nothing to do this cycle)
    fn bytes_available(&mut self) -> Result<usize, LinkError>;

    /// Read one line, without requiring the terminator to be stripped
    ///
    /// May return a partial line if the read timeout elapses first.
    fn read_line(&mut self) -> Result<String, LinkError>;

    /// Human-readable name of the link (port path)
    fn name(&self) -> &str {
        "link"
    }
}
