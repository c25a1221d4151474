//! Line framing for telemetry coming from the sensor board
//!
//! The board writes newline-terminated UTF-8 text. A line whose first and
//! last non-space characters are `{` and `}` is a structured payload: a
//! single-line JSON object of sensor fields. Every other non-blank line is
//! free-form diagnostic text and is surfaced as-is.
//!
//! ```text
//! {"temperature":24.5,"moisture":41,"n_value":40,"p_value":25,"k_value":30}\n
//! WiFi: connecting...\n
//! ```

use serde_json::{Map, Value};
use thiserror::Error;

/// Field names every structured payload must carry
pub const REQUIRED_FIELDS: [&str; 5] = ["temperature", "moisture", "n_value", "p_value", "k_value"];

/// Parsed key-value map of a structured payload
pub type Payload = Map<String, Value>;

/// One classified line from the device
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    /// Empty or whitespace-only line
    Blank,
    /// Structured payload, parsed into a key-value map
    Payload(Payload),
    /// Free-form text from the device firmware
    Diagnostic(String),
}

/// Error decoding a structured payload
#[derive(Debug, Error)]
pub enum FrameError {
    /// Line looked like a payload but is not valid JSON
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),
    /// Line is valid JSON but not an object
    #[error("payload is not a JSON object")]
    NotAnObject,
}

/// Returns true if the (already trimmed) line is framed as a structured payload
pub fn is_structured(line: &str) -> bool {
    line.starts_with('{') && line.ends_with('}')
}

/// Decode raw bytes from the link, dropping invalid UTF-8 sequences
///
/// Line noise between JSON tokens disappears instead of turning into
/// U+FFFD, so a payload with a stray byte still parses.
pub fn decode_line(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

/// Classify one raw line received from the device
///
/// Surrounding whitespace (including the `\r\n` terminator) is stripped
/// first. Structured payloads are parsed; a parse failure is returned as
/// [`FrameError`] so the caller can log and drop the frame.
pub fn classify_line(raw: &str) -> Result<Frame, FrameError> {
    let line = raw.trim();
    if line.is_empty() {
        return Ok(Frame::Blank);
    }

    if is_structured(line) {
        return parse_payload(line).map(Frame::Payload);
    }

    Ok(Frame::Diagnostic(line.to_string()))
}

/// Parse a structured payload line into a key-value map
pub fn parse_payload(line: &str) -> Result<Payload, FrameError> {
    match serde_json::from_str::<Value>(line)? {
        Value::Object(map) => Ok(map),
        _ => Err(FrameError::NotAnObject),
    }
}
