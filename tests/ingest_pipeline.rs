use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use soilsense::{
    CycleOutcome, FeatureVector, IngestConfig, IngestService, LabelEncoder, LinkError, ModelBundle,
    ModelError, SensorLink, SharedState, SoilClassifier, SoilModel, UserPreference,
};

/// In-memory link fed from a shared queue; reports disconnect once drained
#[derive(Clone, Default)]
struct MemoryLink {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl MemoryLink {
    fn push(&self, line: &str) {
        self.lines.lock().unwrap().push_back(format!("{line}\n"));
    }
}

impl SensorLink for MemoryLink {
    fn bytes_available(&mut self) -> Result<usize, LinkError> {
        match self.lines.lock().unwrap().front() {
            Some(line) => Ok(line.len()),
            None => Err(LinkError::Disconnected),
        }
    }

    fn read_line(&mut self) -> Result<String, LinkError> {
        self.lines
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LinkError::Disconnected)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

fn payload(temperature: f64, moisture: f64) -> String {
    format!(
        "{{\"temperature\":{temperature},\"moisture\":{moisture},\"n_value\":40,\"p_value\":25,\"k_value\":30}}"
    )
}

fn service(state: &Arc<SharedState>) -> IngestService {
    IngestService::new(
        SoilClassifier::from_bundle(ModelBundle::fallback().unwrap()),
        Arc::clone(state),
        IngestConfig {
            poll_interval: std::time::Duration::ZERO,
            device_id: "bench-01".to_string(),
        },
    )
}

#[test]
fn latest_reflects_last_accepted_frame() {
    let state = Arc::new(SharedState::default());
    let svc = service(&state);
    let link = MemoryLink::default();

    link.push(&payload(21.0, 80.0));
    link.push("Sensor warming up");
    link.push(&payload(23.5, 40.0));
    link.push(&payload(150.0, 40.0));
    link.push("{\"temperature\": }");
    link.push("{\"temperature\":");
    link.push("");

    let result = svc.run(link, &AtomicBool::new(false));
    assert!(matches!(result, Err(LinkError::Disconnected)));

    let latest = state.latest().expect("a reading was published");
    assert_eq!(latest.device_id, "bench-01");
    assert_eq!(latest.temperature, 23.5);
    assert_eq!(latest.moisture, 40.0);
    assert_eq!(latest.soil_type, "Loamy");
    assert_eq!(
        latest.recommendation,
        "Maize/Soybean. Balanced soil, moderate irrigation. Good organic content."
    );

    let stats = state.stats().snapshot();
    assert_eq!(stats.processed, 2);
    assert_eq!(stats.dropped, 2);
    // Unterminated brace is device text, not a payload
    assert_eq!(stats.diagnostics, 2);
    assert!(!state.processor_running());
}

#[test]
fn preference_change_affects_only_later_frames() {
    let state = Arc::new(SharedState::default());
    let svc = service(&state);
    let mut link = MemoryLink::default();

    link.push(&payload(20.0, 70.0));
    let first = match svc.poll_once(&mut link) {
        Ok(CycleOutcome::Processed(reading)) => reading,
        other => panic!("unexpected outcome {:?}", other),
    };
    assert_eq!(first.user_color, "Brown");

    state.set_preference(UserPreference::new("Sandy", "Red"));
    assert_eq!(first.user_color, "Brown");

    link.push(&payload(20.0, 70.0));
    let second = match svc.poll_once(&mut link) {
        Ok(CycleOutcome::Processed(reading)) => reading,
        other => panic!("unexpected outcome {:?}", other),
    };
    assert_eq!(second.user_texture, "Sandy");
    assert_eq!(second.user_color, "Red");
    assert!(second
        .recommendation
        .contains("Iron-rich soil, may need pH adjustment."));
    assert!(Arc::ptr_eq(&second, &state.latest().unwrap()));
}

#[test]
fn unknown_color_yields_advice_without_color_note() {
    let state = Arc::new(SharedState::new(UserPreference::new("Loamy", "Purple")));
    let svc = service(&state);

    match svc.process_line(&payload(20.0, 70.0)) {
        CycleOutcome::Processed(reading) => {
            assert_eq!(
                reading.recommendation,
                "Maize/Soybean. Balanced soil, moderate irrigation. "
            );
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn boundary_values_are_accepted() {
    let state = Arc::new(SharedState::default());
    let svc = service(&state);

    for (t, m) in [(-40.0, 0.0), (100.0, 100.0)] {
        assert!(matches!(
            svc.process_line(&payload(t, m)),
            CycleOutcome::Processed(_)
        ));
    }
    assert!(matches!(
        svc.process_line(&payload(20.0, 100.5)),
        CycleOutcome::Dropped(_)
    ));
    assert_eq!(state.latest().unwrap().moisture, 100.0);
}

struct UnavailableModel;

impl SoilModel for UnavailableModel {
    fn predict(&self, _features: &FeatureVector) -> Result<usize, ModelError> {
        Err(ModelError::NonFiniteFeature)
    }

    fn class_count(&self) -> usize {
        0
    }
}

#[test]
fn model_failure_falls_back_to_user_texture() {
    let state = Arc::new(SharedState::new(UserPreference::new("fine", "Black")));
    let svc = IngestService::new(
        SoilClassifier::new(Box::new(UnavailableModel), LabelEncoder::default()),
        Arc::clone(&state),
        IngestConfig::default(),
    );
    let mut link = MemoryLink::default();
    link.push(&payload(22.0, 65.0));

    let reading = match svc.poll_once(&mut link) {
        Ok(CycleOutcome::Processed(reading)) => reading,
        other => panic!("unexpected outcome {:?}", other),
    };
    assert_eq!(reading.soil_type, "fine");
    assert_eq!(reading.user_texture, "fine");
    assert_eq!(
        reading.recommendation,
        "Consult agricultural expert High organic matter, very fertile."
    );

    let latest = state.latest().expect("degraded reading is still published");
    assert!(Arc::ptr_eq(&reading, &latest));

    let stats = state.stats().snapshot();
    assert_eq!(stats.processed, 1);
    assert_eq!(stats.degraded, 1);
    assert_eq!(stats.dropped, 0);
}
