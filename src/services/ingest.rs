//! Ingest service - frame reader loop and processing pipeline
//!
//! Each poll cycle reads at most one line from the link and pushes it
//! through: framing -> validation -> classification -> recommendation ->
//! latest-reading slot. A bad frame is logged and dropped; only losing the
//! link ends the loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::Local;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::IngestConfig;
use crate::domain::{recommend, validate_payload, ProcessedReading, ValidationError};
use crate::ingest_protocol::{classify_line, Frame, FrameError, Payload};
use crate::ports::link::{LinkError, SensorLink};
use crate::services::classifier::SoilClassifier;
use crate::state::SharedState;

/// Why a frame was dropped
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("JSON decode error: {0}")]
    Frame(#[from] FrameError),
    #[error("invalid sensor data: {0}")]
    Validation(#[from] ValidationError),
    #[error("link error: {0}")]
    Link(#[from] LinkError),
}

/// What a single poll cycle did
#[derive(Debug)]
pub enum CycleOutcome {
    /// No bytes waiting
    Idle,
    /// Line was empty after trimming
    Blank,
    /// Free-form device text, surfaced as-is
    Diagnostic(String),
    /// Frame accepted and published
    Processed(Arc<ProcessedReading>),
    /// Frame discarded; the cache is unchanged
    Dropped(IngestError),
    /// Link reported a transient error before a frame was read
    Stalled(LinkError),
}

/// Frame reader and processing pipeline
pub struct IngestService {
    classifier: SoilClassifier,
    state: Arc<SharedState>,
    config: IngestConfig,
}

impl IngestService {
    pub fn new(classifier: SoilClassifier, state: Arc<SharedState>, config: IngestConfig) -> Self {
        Self {
            classifier,
            state,
            config,
        }
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    /// Poll the link until `stop` is raised or the link is lost
    ///
    /// The link is dropped (closing the port) before returning.
    pub fn run<L: SensorLink>(&self, mut link: L, stop: &AtomicBool) -> Result<(), LinkError> {
        info!(link = link.name(), "Listening for sensor data");
        self.state.set_processor_running(true);

        let result = loop {
            if stop.load(Ordering::Relaxed) {
                info!("Processor stopped");
                break Ok(());
            }

            if let Err(e) = self.poll_once(&mut link) {
                error!("Connection lost: {}", e);
                break Err(e);
            }

            thread::sleep(self.config.poll_interval);
        };

        self.state.set_processor_running(false);
        drop(link);
        info!("Serial connection closed");
        result
    }

    /// One poll cycle; only an unrecoverable link error is returned
    pub fn poll_once<L: SensorLink>(&self, link: &mut L) -> Result<CycleOutcome, LinkError> {
        let waiting = match link.bytes_available() {
            Ok(n) => n,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Serial poll failed: {}", e);
                return Ok(CycleOutcome::Stalled(e));
            }
        };
        if waiting == 0 {
            return Ok(CycleOutcome::Idle);
        }

        match link.read_line() {
            Ok(line) => Ok(self.process_line(&line)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => Ok(self.drop_frame(e.into())),
        }
    }

    /// Classify a raw line and process it if it is a structured payload
    pub fn process_line(&self, raw: &str) -> CycleOutcome {
        match classify_line(raw) {
            Ok(Frame::Blank) => CycleOutcome::Blank,
            Ok(Frame::Diagnostic(text)) => {
                info!(target: "device", "{}", text);
                self.state.stats().record_diagnostic();
                CycleOutcome::Diagnostic(text)
            }
            Ok(Frame::Payload(payload)) => {
                debug!("Raw JSON: {}", raw.trim());
                match self.process_payload(&payload) {
                    Ok(reading) => CycleOutcome::Processed(reading),
                    Err(e) => self.drop_frame(e.into()),
                }
            }
            Err(e) => {
                debug!("Problematic data: {}", raw.trim());
                self.drop_frame(e.into())
            }
        }
    }

    /// Validate, classify and publish one payload
    pub fn process_payload(&self, payload: &Payload) -> Result<Arc<ProcessedReading>, ValidationError> {
        let frame = validate_payload(payload)?;

        // One preference snapshot for both classification and advice
        let preference = self.state.preference();
        let classification = self.classifier.classify(&frame, &preference);
        let recommendation = recommend(&classification.soil_type, frame.moisture, &preference.color);

        let reading = ProcessedReading::new(
            self.config.device_id.as_str(),
            Local::now().naive_local(),
            &frame,
            classification.soil_type,
            &preference,
            recommendation,
        );

        let reading = self.state.publish(reading);
        self.state.stats().record_processed(classification.degraded);
        info!(
            soil_type = %reading.soil_type,
            moisture = reading.moisture,
            temperature = reading.temperature,
            degraded = classification.degraded,
            "Data processed successfully"
        );
        debug!("\n{}", reading);
        Ok(reading)
    }

    fn drop_frame(&self, reason: IngestError) -> CycleOutcome {
        match &reason {
            IngestError::Validation(e) => warn!("Invalid sensor data received: {}", e),
            other => error!("{}", other),
        }
        self.state.stats().record_dropped();
        CycleOutcome::Dropped(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ModelBundle;
    use crate::domain::UserPreference;
    use std::collections::VecDeque;
    use std::io;

    enum Step {
        Line(&'static str),
        ReadError,
        PollError,
    }

    /// Link that replays a script, then reports disconnect
    struct ScriptedLink {
        steps: VecDeque<Step>,
    }

    impl ScriptedLink {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: steps.into(),
            }
        }
    }

    impl SensorLink for ScriptedLink {
        fn bytes_available(&mut self) -> Result<usize, LinkError> {
            if matches!(self.steps.front(), Some(Step::PollError)) {
                self.steps.pop_front();
                return Err(LinkError::Read(io::Error::from(io::ErrorKind::Interrupted)));
            }
            match self.steps.front() {
                Some(Step::Line(l)) => Ok(l.len()),
                Some(_) => Ok(1),
                None => Err(LinkError::Disconnected),
            }
        }

        fn read_line(&mut self) -> Result<String, LinkError> {
            match self.steps.pop_front() {
                Some(Step::Line(l)) => Ok(l.to_string()),
                Some(_) => Err(LinkError::Read(io::Error::from(io::ErrorKind::Interrupted))),
                None => Err(LinkError::Disconnected),
            }
        }
    }

    const GOOD: &str = "{\"temperature\":24.5,\"moisture\":15,\"n_value\":40,\"p_value\":25,\"k_value\":30}\n";

    fn service() -> IngestService {
        let classifier = SoilClassifier::from_bundle(ModelBundle::fallback().unwrap());
        IngestService::new(
            classifier,
            Arc::new(SharedState::default()),
            IngestConfig {
                poll_interval: std::time::Duration::ZERO,
                ..IngestConfig::default()
            },
        )
    }

    #[test]
    fn test_good_payload_is_published() {
        let svc = service();
        match svc.process_line(GOOD) {
            CycleOutcome::Processed(reading) => {
                assert_eq!(reading.soil_type, "Loamy");
                assert_eq!(reading.moisture, 15.0);
                assert!(reading.recommendation.ends_with(" 🚨 CRITICAL - IRRIGATE IMMEDIATELY!"));
                assert!(reading.recommendation.contains("Good organic content."));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(svc.state().latest().unwrap().device_id, "ESP32_SoilSense_01");
    }

    #[test]
    fn test_rejected_payload_leaves_cache() {
        let svc = service();
        svc.process_line(GOOD);
        let before = svc.state().latest().unwrap();

        let missing = "{\"temperature\":24.5,\"moisture\":50,\"n_value\":40,\"p_value\":25}";
        assert!(matches!(
            svc.process_line(missing),
            CycleOutcome::Dropped(IngestError::Validation(ValidationError::MissingField("k_value")))
        ));
        let hot = "{\"temperature\":150,\"moisture\":50,\"n_value\":40,\"p_value\":25,\"k_value\":30}";
        assert!(matches!(svc.process_line(hot), CycleOutcome::Dropped(_)));

        assert!(Arc::ptr_eq(&before, &svc.state().latest().unwrap()));
        assert_eq!(svc.state().stats().snapshot().dropped, 2);
    }

    #[test]
    fn test_free_text_never_publishes() {
        let svc = service();
        assert!(matches!(
            svc.process_line("WiFi connected\r\n"),
            CycleOutcome::Diagnostic(ref t) if t == "WiFi connected"
        ));
        assert!(matches!(svc.process_line("   "), CycleOutcome::Blank));
        assert!(matches!(
            svc.process_line("{\"temperature\": oops}"),
            CycleOutcome::Dropped(IngestError::Frame(_))
        ));
        assert!(svc.state().latest().is_none());
    }

    #[test]
    fn test_preference_applies_to_next_frame() {
        let svc = service();
        svc.state().set_preference(UserPreference::new("fine", "Black"));
        match svc.process_line(GOOD) {
            CycleOutcome::Processed(reading) => {
                assert_eq!(reading.user_texture, "fine");
                assert_eq!(reading.user_color, "Black");
                assert!(reading.recommendation.contains("High organic matter"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_poll_once_idle_and_read_errors() {
        let svc = service();
        let mut link = ScriptedLink::new(vec![Step::Line(""), Step::ReadError, Step::Line(GOOD)]);

        // Zero bytes reported for an empty script line
        assert!(matches!(svc.poll_once(&mut link), Ok(CycleOutcome::Idle)));
        link.steps.pop_front();
        assert!(matches!(
            svc.poll_once(&mut link),
            Ok(CycleOutcome::Dropped(IngestError::Link(_)))
        ));
        assert!(matches!(svc.poll_once(&mut link), Ok(CycleOutcome::Processed(_))));
        assert!(matches!(
            svc.poll_once(&mut link),
            Err(LinkError::Disconnected)
        ));
    }

    #[test]
    fn test_poll_error_is_not_a_dropped_frame() {
        let svc = service();
        let mut link = ScriptedLink::new(vec![Step::PollError, Step::Line(GOOD)]);

        assert!(matches!(
            svc.poll_once(&mut link),
            Ok(CycleOutcome::Stalled(LinkError::Read(_)))
        ));
        assert_eq!(svc.state().stats().snapshot().dropped, 0);
        assert!(matches!(svc.poll_once(&mut link), Ok(CycleOutcome::Processed(_))));
    }

    #[test]
    fn test_model_failure_publishes_user_texture() {
        struct BrokenModel;

        impl crate::ports::SoilModel for BrokenModel {
            fn predict(
                &self,
                _features: &crate::domain::FeatureVector,
            ) -> Result<usize, crate::ports::ModelError> {
                Err(crate::ports::ModelError::NotFitted)
            }

            fn class_count(&self) -> usize {
                0
            }
        }

        let state = Arc::new(SharedState::new(UserPreference::new("fine", "Black")));
        let classifier = SoilClassifier::new(
            Box::new(BrokenModel),
            crate::adapters::LabelEncoder::default(),
        );
        let svc = IngestService::new(classifier, Arc::clone(&state), IngestConfig::default());

        match svc.process_line(GOOD) {
            CycleOutcome::Processed(reading) => {
                assert_eq!(reading.soil_type, "fine");
                assert!(reading.recommendation.starts_with("Consult agricultural expert "));
                assert!(Arc::ptr_eq(&reading, &state.latest().unwrap()));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        let stats = state.stats().snapshot();
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.degraded, 1);
    }

    #[test]
    fn test_run_until_disconnect() {
        let svc = service();
        let stop = AtomicBool::new(false);
        let link = ScriptedLink::new(vec![
            Step::Line("booting\n"),
            Step::Line("{not json}\n"),
            Step::Line(GOOD),
        ]);

        let result = svc.run(link, &stop);
        assert!(matches!(result, Err(LinkError::Disconnected)));
        assert!(!svc.state().processor_running());

        let stats = svc.state().stats().snapshot();
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.diagnostics, 1);
    }

    #[test]
    fn test_run_honours_stop_flag() {
        let svc = service();
        let stop = AtomicBool::new(true);
        let link = ScriptedLink::new(vec![Step::Line(GOOD)]);
        assert!(svc.run(link, &stop).is_ok());
        assert!(svc.state().latest().is_none());
    }
}
