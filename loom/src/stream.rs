//! Best-effort event emission for a single request.
//!
//! This core has exactly one event type ([`stream_event::ProtocolEvent`]); emission never
//! blocks or back-pressures the decision loop — a dropped event must not stall it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use stream_event::ProtocolEvent;
use tokio::sync::mpsc;

/// Type-erased writer tools use to emit progress without depending on the agent state type.
#[derive(Clone)]
pub struct ToolStreamWriter {
    emit_fn: Arc<dyn Fn(Value) -> bool + Send + Sync>,
}

impl ToolStreamWriter {
    pub fn new(emit_fn: impl Fn(Value) -> bool + Send + Sync + 'static) -> Self {
        Self { emit_fn: Arc::new(emit_fn) }
    }

    pub fn noop() -> Self {
        Self { emit_fn: Arc::new(|_| false) }
    }

    pub fn emit_custom(&self, value: Value) -> bool {
        (self.emit_fn)(value)
    }
}

impl Default for ToolStreamWriter {
    fn default() -> Self {
        Self::noop()
    }
}

impl std::fmt::Debug for ToolStreamWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolStreamWriter").finish_non_exhaustive()
    }
}

/// Emits [`ProtocolEvent`]s for one request over a bounded channel.
///
/// `try_send` only: a full channel (a slow or disconnected consumer) drops the event and
/// logs a warning once, rather than stalling the decision loop.
#[derive(Clone)]
pub struct EventWriter {
    tx: Option<mpsc::Sender<ProtocolEvent>>,
    warned: Arc<AtomicBool>,
}

impl EventWriter {
    pub fn new(tx: mpsc::Sender<ProtocolEvent>) -> Self {
        Self { tx: Some(tx), warned: Arc::new(AtomicBool::new(false)) }
    }

    pub fn noop() -> Self {
        Self { tx: None, warned: Arc::new(AtomicBool::new(false)) }
    }

    pub fn emit(&self, event: ProtocolEvent) {
        let Some(tx) = &self.tx else { return };
        if tx.try_send(event).is_err() && !self.warned.swap(true, Ordering::Relaxed) {
            tracing::warn!("event channel full or closed, dropping subsequent events");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_stream_writer_noop_returns_false() {
        let writer = ToolStreamWriter::noop();
        assert!(!writer.emit_custom(serde_json::json!({})));
    }

    #[tokio::test]
    async fn event_writer_delivers_events() {
        let (tx, mut rx) = mpsc::channel(4);
        let writer = EventWriter::new(tx);
        writer.emit(ProtocolEvent::Status { message: "hi".into() });
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, ProtocolEvent::Status { .. }));
    }

    #[tokio::test]
    async fn event_writer_drops_silently_when_full() {
        let (tx, _rx) = mpsc::channel(1);
        let writer = EventWriter::new(tx);
        writer.emit(ProtocolEvent::Status { message: "1".into() });
        writer.emit(ProtocolEvent::Status { message: "2".into() });
    }
}
