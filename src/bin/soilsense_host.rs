//! SoilSense host
//!
//! Runs on the PC the sensor board is plugged into. Reads telemetry from
//! the board's serial port on a background thread and serves the latest
//! processed reading over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! # List available serial ports
//! cargo run --bin soilsense_host -- --list-ports
//!
//! # Connect to the configured port (falls back to a detected ESP32 board)
//! cargo run --bin soilsense_host
//!
//! # Connect to a specific port with an initial soil preference
//! cargo run --bin soilsense_host -- --port COM6 --texture fine --color Black
//!
//! # Write fallback model artifacts if none exist yet
//! cargo run --bin soilsense_host -- --init-artifacts
//! ```
//!
//! ## Endpoints
//!
//! - `GET /latest`, `GET /recommendation`, `GET /health`
//! - `GET /preferences`, `POST /preferences` with `{"texture": "...", "color": "..."}`

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use soilsense::adapters::serial::{self, SerialLinkAdapter};
use soilsense::config::{
    HostConfig, IngestConfig, ModelConfig, SerialConfig, ServerConfig, DEFAULT_BAUD_RATE,
    DEFAULT_BIND, DEFAULT_CORS_ORIGINS, DEFAULT_PORT, DEFAULT_READ_TIMEOUT,
};
use soilsense::domain::{UserPreference, COLOR_OPTIONS, DEFAULT_DEVICE_ID};
use soilsense::http::{build_router, AppState};
use soilsense::{Error, IngestService, ModelBundle, SharedState, SoilClassifier};

#[derive(Parser, Debug)]
#[command(name = "soilsense_host")]
#[command(about = "Soil sensor ingest and recommendation service")]
struct Cli {
    /// List serial ports and exit
    #[arg(long, default_value_t = false)]
    list_ports: bool,

    /// Serial port of the sensor board
    #[arg(long, env = "SOILSENSE_PORT")]
    port: Option<String>,

    #[arg(long, env = "SOILSENSE_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    #[arg(long, env = "SOILSENSE_CONNECT_ATTEMPTS", default_value_t = 3)]
    connect_attempts: u32,

    #[arg(long, env = "SOILSENSE_RETRY_DELAY_MS", default_value_t = 2000)]
    retry_delay_ms: u64,

    #[arg(long, env = "SOILSENSE_POLL_MS", default_value_t = 100)]
    poll_interval_ms: u64,

    #[arg(long, env = "SOILSENSE_DEVICE_ID", default_value = DEFAULT_DEVICE_ID)]
    device_id: String,

    /// Address the HTTP interface listens on
    #[arg(long, env = "SOILSENSE_BIND", default_value = DEFAULT_BIND)]
    bind: SocketAddr,

    /// Browser origin allowed to call the API (repeatable)
    #[arg(long = "cors-origin", env = "SOILSENSE_CORS_ORIGINS", value_delimiter = ',')]
    cors_origins: Vec<String>,

    /// Classifier artifact
    #[arg(long, env = "SOILSENSE_MODEL", default_value = "soil_model.bin")]
    model: PathBuf,

    /// Label encoder artifact
    #[arg(long, env = "SOILSENSE_ENCODER", default_value = "label_encoder.bin")]
    encoder: PathBuf,

    /// Write fallback artifacts to --model/--encoder if they are missing
    #[arg(long, default_value_t = false)]
    init_artifacts: bool,

    /// Initial soil texture (e.g. Gritty, "medium grit", fine, Smooth-powdery)
    #[arg(long, env = "SOILSENSE_TEXTURE", default_value = "Loamy")]
    texture: String,

    /// Initial soil color (Brown, Black, Red, Yellow, White, Grey)
    #[arg(long, env = "SOILSENSE_COLOR", default_value = "Brown")]
    color: String,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

impl Cli {
    fn host_config(&self) -> HostConfig {
        HostConfig {
            serial: SerialConfig {
                port: resolve_port(self.port.as_deref()),
                baud_rate: self.baud,
                connect_attempts: self.connect_attempts,
                retry_delay: Duration::from_millis(self.retry_delay_ms),
                read_timeout: DEFAULT_READ_TIMEOUT,
            },
            ingest: IngestConfig {
                poll_interval: Duration::from_millis(self.poll_interval_ms),
                device_id: self.device_id.clone(),
            },
            model: ModelConfig {
                model_path: self.model.clone(),
                encoder_path: self.encoder.clone(),
            },
            server: ServerConfig {
                bind: self.bind,
                cors_allowed_origins: if self.cors_origins.is_empty() {
                    DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect()
                } else {
                    self.cors_origins.clone()
                },
            },
            initial_preference: UserPreference::new(self.texture.clone(), self.color.clone()),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    if cli.list_ports {
        list_ports();
        return ExitCode::SUCCESS;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let config = cli.host_config();
    info!("SoilSense Processor - Starting...");

    let pref = &config.initial_preference;
    info!(texture = %pref.texture, color = %pref.color, "Initial soil preference");
    if !COLOR_OPTIONS.contains(&pref.color.as_str()) {
        warn!(color = %pref.color, "unknown color, recommendations will carry no color note");
    }

    if cli.init_artifacts {
        init_artifacts(&config.model)?;
    }

    let bundle = ModelBundle::load_or_fallback(&config.model.model_path, &config.model.encoder_path)?;
    let model_source = bundle.source;
    let state = Arc::new(SharedState::new(config.initial_preference.clone()));

    let link = match SerialLinkAdapter::connect(&config.serial) {
        Some(link) => link,
        None => {
            error!("Failed to establish serial connection. Please check:");
            error!("1. The sensor board is connected to {}", config.serial.port);
            error!("2. The baud rate is {}", config.serial.baud_rate);
            error!("3. No other program is using the serial port");
            return Err(Error::ConnectionUnavailable {
                port: config.serial.port.clone(),
                attempts: config.serial.connect_attempts,
            });
        }
    };

    let service = IngestService::new(
        SoilClassifier::from_bundle(bundle),
        Arc::clone(&state),
        config.ingest.clone(),
    );

    let stop = Arc::new(AtomicBool::new(false));
    let (done_tx, done_rx) = oneshot::channel::<()>();
    let worker_stop = Arc::clone(&stop);
    let worker = thread::Builder::new()
        .name("soilsense-ingest".to_string())
        .spawn(move || {
            let result = service.run(link, &worker_stop);
            let _ = done_tx.send(());
            result
        })?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let app = AppState::new(state, model_source)
        .with_cors_origins(config.server.cors_allowed_origins.clone());
    let served = runtime.block_on(serve(config.server.bind, app, done_rx));

    stop.store(true, Ordering::Relaxed);
    let ingest = worker.join().map_err(|_| Error::WorkerPanicked)?;
    served?;
    ingest?;
    info!("SoilSense Processor - Stopped");
    Ok(())
}

async fn serve(bind: SocketAddr, app: AppState, worker_done: oneshot::Receiver<()>) -> Result<(), Error> {
    let listener = TcpListener::bind(bind).await?;
    info!(addr = %bind, "SoilSense Processor - Ready! Listening for sensor data");
    axum::serve(listener, build_router(app))
        .with_graceful_shutdown(wait_for_shutdown(worker_done))
        .await?;
    Ok(())
}

/// Resolves on Ctrl+C / SIGTERM, or when the ingest worker exits
async fn wait_for_shutdown(worker_done: oneshot::Receiver<()>) {
    tokio::select! {
        _ = shutdown_signal() => info!("Processor stopped by user"),
        _ = worker_done => warn!("Ingest worker exited, shutting down"),
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Configured port if present, else a detected board, else the first port
fn resolve_port(requested: Option<&str>) -> String {
    let requested = requested.unwrap_or(DEFAULT_PORT);

    let ports = serial::available_ports();
    if ports.is_empty() || ports.iter().any(|p| p.port_name == requested) {
        return os_port_name(requested);
    }

    let fallback = serial::select_device_port(&ports).unwrap_or_else(|| ports[0].port_name.clone());
    warn!("Configured port {} not found, trying {}", requested, fallback);
    os_port_name(&fallback)
}

/// On Windows, COM ports >= 10 need the \\.\COMxx format
fn os_port_name(name: &str) -> String {
    if cfg!(target_os = "windows") && name.starts_with("COM") {
        format!(r"\\.\{}", name)
    } else {
        name.to_string()
    }
}

fn list_ports() {
    println!("Available serial ports:");
    let ports = serial::available_ports();
    if ports.is_empty() {
        println!("  (none)");
    }
    for port in &ports {
        println!("  {}", serial::describe_port(port));
    }
}

fn init_artifacts(model: &ModelConfig) -> Result<(), Error> {
    if model.model_path.exists() && model.encoder_path.exists() {
        info!("Model artifacts already present");
        return Ok(());
    }
    ModelBundle::fallback()?.save(&model.model_path, &model.encoder_path)?;
    info!(
        model = %model.model_path.display(),
        encoder = %model.encoder_path.display(),
        "Fallback model artifacts written"
    );
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
