//! State shared between the ingest worker and the HTTP handlers
//!
//! Both slots hold an `Arc` that is swapped as a whole: writers build a new
//! value and replace the pointer, readers clone the pointer and keep a
//! consistent snapshot for as long as they need it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use crate::domain::{ProcessedReading, UserPreference};

/// Counters maintained by the ingest loop
#[derive(Debug, Default)]
pub struct IngestStats {
    processed: AtomicU64,
    degraded: AtomicU64,
    dropped: AtomicU64,
    diagnostics: AtomicU64,
}

/// Point-in-time copy of [`IngestStats`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Frames that produced a reading
    pub processed: u64,
    /// Readings whose soil type fell back to the user texture
    pub degraded: u64,
    /// Frames discarded (malformed, invalid, read errors)
    pub dropped: u64,
    /// Free-text lines from the device
    pub diagnostics: u64,
}

impl IngestStats {
    pub fn record_processed(&self, degraded: bool) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        if degraded {
            self.degraded.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_diagnostic(&self) {
        self.diagnostics.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            diagnostics: self.diagnostics.load(Ordering::Relaxed),
        }
    }
}

/// Latest-reading cache, user preference and worker status
#[derive(Debug)]
pub struct SharedState {
    latest: RwLock<Option<Arc<ProcessedReading>>>,
    preference: RwLock<Arc<UserPreference>>,
    processor_running: AtomicBool,
    stats: IngestStats,
}

impl SharedState {
    pub fn new(initial_preference: UserPreference) -> Self {
        Self {
            latest: RwLock::new(None),
            preference: RwLock::new(Arc::new(initial_preference)),
            processor_running: AtomicBool::new(false),
            stats: IngestStats::default(),
        }
    }

    /// Most recent reading, absent until the first valid frame
    pub fn latest(&self) -> Option<Arc<ProcessedReading>> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the latest reading
    pub fn publish(&self, reading: ProcessedReading) -> Arc<ProcessedReading> {
        let reading = Arc::new(reading);
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&reading));
        reading
    }

    /// Preference currently in effect
    pub fn preference(&self) -> Arc<UserPreference> {
        self.preference
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the preference; the next classification uses it
    pub fn set_preference(&self, preference: UserPreference) -> Arc<UserPreference> {
        let preference = Arc::new(preference);
        *self
            .preference
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::clone(&preference);
        preference
    }

    pub fn processor_running(&self) -> bool {
        self.processor_running.load(Ordering::Acquire)
    }

    pub fn set_processor_running(&self, running: bool) {
        self.processor_running.store(running, Ordering::Release);
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(UserPreference::default())
    }
}
