//! Serial port link adapter
//!
//! Implements [`SensorLink`] over the `serialport` crate, plus the bounded
//! connect-with-retry used at startup and USB device discovery.

use std::io::{self, Read};
use std::thread;
use std::time::Duration;

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use tracing::{error, info};

use crate::config::SerialConfig;
use crate::ingest_protocol::decode_line;
use crate::ports::link::{LinkError, SensorLink};

/// Longest line accepted before the frame is abandoned
pub const MAX_LINE_BYTES: usize = 4096;

/// USB vendor ids of the bridges commonly found on ESP32 boards
pub const ESP32_BRIDGE_VIDS: [u16; 4] = [
    0x303a, // Espressif native USB
    0x10c4, // Silicon Labs CP210x
    0x1a86, // WCH CH340
    0x0403, // FTDI
];

/// Serial port link to the sensor board
pub struct SerialLinkAdapter {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialLinkAdapter {
    /// Open the port once
    pub fn open(port_name: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self, LinkError> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(read_timeout)
            .flow_control(serialport::FlowControl::None)
            .open()
            .map_err(|source| LinkError::Open {
                port: port_name.to_string(),
                source,
            })?;

        Ok(Self {
            port,
            name: port_name.to_string(),
        })
    }

    /// Open the configured port, retrying with a fixed delay
    ///
    /// Returns `None` once every attempt has failed; the caller decides
    /// whether that aborts startup.
    pub fn connect(config: &SerialConfig) -> Option<Self> {
        let link = connect_with_retry(config.connect_attempts, config.retry_delay, || {
            Self::open(&config.port, config.baud_rate, config.read_timeout)
        })?;
        info!(port = %config.port, baud = config.baud_rate, "serial connected");
        Some(link)
    }
}

impl SensorLink for SerialLinkAdapter {
    fn bytes_available(&mut self) -> Result<usize, LinkError> {
        self.port
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(|e| classify_io(io::Error::from(e)))
    }

    fn read_line(&mut self) -> Result<String, LinkError> {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            match self.port.read(&mut byte) {
                Ok(1) => {
                    if byte[0] == b'\n' {
                        break;
                    }
                    line.push(byte[0]);
                    if line.len() > MAX_LINE_BYTES {
                        return Err(LinkError::LineTooLong(MAX_LINE_BYTES));
                    }
                }
                Ok(_) => {
                    // End of stream
                    if line.is_empty() {
                        return Err(LinkError::Disconnected);
                    }
                    break;
                }
                Err(ref e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) => return Err(classify_io(e)),
            }
        }

        Ok(decode_line(&line))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Run `open` up to `attempts` times, sleeping `delay` between failures
pub fn connect_with_retry<T, F>(attempts: u32, delay: Duration, mut open: F) -> Option<T>
where
    F: FnMut() -> Result<T, LinkError>,
{
    for attempt in 1..=attempts {
        match open() {
            Ok(link) => return Some(link),
            Err(e) => {
                error!("Attempt {}/{} failed: {}", attempt, attempts, e);
                if attempt < attempts {
                    thread::sleep(delay);
                }
            }
        }
    }
    None
}

fn classify_io(e: io::Error) -> LinkError {
    match e.kind() {
        io::ErrorKind::NotFound
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::NotConnected
        | io::ErrorKind::UnexpectedEof => LinkError::Disconnected,
        _ => LinkError::Read(e),
    }
}

/// List serial ports visible to the host
pub fn available_ports() -> Vec<SerialPortInfo> {
    match serialport::available_ports() {
        Ok(ports) => ports,
        Err(e) => {
            error!("Error listing ports: {}", e);
            Vec::new()
        }
    }
}

/// Pick the first USB port whose vendor id belongs to a known ESP32 bridge
pub fn select_device_port(ports: &[SerialPortInfo]) -> Option<String> {
    ports.iter().find_map(|port| match &port.port_type {
        SerialPortType::UsbPort(info) if ESP32_BRIDGE_VIDS.contains(&info.vid) => {
            Some(port.port_name.clone())
        }
        _ => None,
    })
}

pub fn port_type_name(port_type: &SerialPortType) -> &'static str {
    match port_type {
        SerialPortType::UsbPort(_) => "USB",
        SerialPortType::BluetoothPort => "Bluetooth",
        SerialPortType::PciPort => "PCI",
        SerialPortType::Unknown => "Unknown",
    }
}

/// One-line description used by `--list-ports`
pub fn describe_port(port: &SerialPortInfo) -> String {
    match &port.port_type {
        SerialPortType::UsbPort(info) => {
            let mut text = format!(
                "{} - USB (VID: 0x{:04x}, PID: 0x{:04x})",
                port.port_name, info.vid, info.pid
            );
            if let Some(ref product) = info.product {
                text.push_str(&format!(" {}", product));
            }
            if ESP32_BRIDGE_VIDS.contains(&info.vid) {
                text.push_str(" [sensor board?]");
            }
            text
        }
        other => format!("{} - {}", port.port_name, port_type_name(other)),
    }
}
