use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

/// Ein Eintrag im Verlaufsprotokoll einer Orchestrierung
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub level: EventLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Gepufferter Event-Sink, gescoped auf einen einzelnen Action-Aufruf.
/// Die Events wandern am Ende in den ActionReport statt in eine Logdatei.
#[derive(Debug, Default)]
pub struct EventSink {
    events: Mutex<Vec<Event>>,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{message}");
        self.push(EventLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.push(EventLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{message}");
        self.push(EventLevel::Error, message);
    }

    fn push(&self, level: EventLevel, message: String) {
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        events.push(Event {
            level,
            message,
            at: Utc::now(),
        });
    }

    /// Entnimm alle Events; der Sink ist danach leer
    pub fn drain(&self) -> Vec<Event> {
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_sink() {
        let sink = EventSink::new();
        sink.info("one");
        sink.warn("two");

        let events = sink.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].level, EventLevel::Info);
        assert_eq!(events[1].level, EventLevel::Warn);
        assert!(sink.drain().is_empty());
    }
}
