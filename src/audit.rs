//! Security event construction and sinks.
//!
//! A [`SecurityEvent`] is built for every rejection and handed to the
//! injected [`EventSink`]. The sink is best-effort: errors and panics it
//! raises are discarded by the orchestrator so observability can never change
//! a verdict.

use crate::verdict::{RejectReason, Severity, Verdict};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use thiserror::Error;
use time::OffsetDateTime;

/// Unique id for one security event: unix milliseconds plus a random hex
/// suffix, e.g. `1754550000123-9f3a1c02`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(String);

impl EventId {
    pub fn generate() -> Self {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        EventId(format!("{millis}-{:08x}", rand::random::<u32>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Audit record of one rejected URL.
///
/// Built only on rejection and handed to the sink; the gate keeps no copy.
/// This is the one place the verbatim attempted URL is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub id: EventId,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub severity: Severity,
    pub attempted_url: String,
    pub reason: String,
    pub indicators: Vec<String>,
}

impl SecurityEvent {
    pub fn for_rejection(attempted_url: &str, verdict: &Verdict) -> Self {
        debug_assert!(!verdict.allowed, "events are only built for rejections");
        Self {
            id: EventId::generate(),
            timestamp: OffsetDateTime::now_utc(),
            severity: verdict.severity,
            attempted_url: attempted_url.to_string(),
            reason: verdict
                .reason_text()
                .unwrap_or_else(|| RejectReason::Internal.to_string()),
            indicators: verdict.indicators.clone(),
        }
    }
}

/// Failure raised by a sink. The orchestrator logs and discards it.
#[derive(Debug, Error)]
#[error("event sink failed: {message}")]
pub struct SinkError {
    pub message: String,
}

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Destination for rejection events.
///
/// `record` is called on the validation path, so implementations should be
/// cheap or hand off to a buffer; anything they return or panic with is
/// swallowed by the caller.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &SecurityEvent) -> Result<(), SinkError>;
}

/// Sink that writes one JSON line per event through `tracing`, with the
/// level mapped from the event severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &SecurityEvent) -> Result<(), SinkError> {
        let json = serde_json::to_string(event).map_err(|e| SinkError::new(e.to_string()))?;
        match event.severity {
            Severity::Critical | Severity::High => {
                tracing::error!(target: "linkgate_audit", "{json}")
            }
            Severity::Medium => tracing::warn!(target: "linkgate_audit", "{json}"),
            Severity::Low => tracing::info!(target: "linkgate_audit", "{json}"),
        }
        Ok(())
    }
}

/// Buffering sink for tests and for embedders that forward events to their
/// own telemetry.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<SecurityEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<SecurityEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: &SecurityEvent) -> Result<(), SinkError> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| SinkError::new("event buffer lock poisoned"))?;
        events.push(event.clone());
        Ok(())
    }
}
