// Serde traits so events can be shipped as JSON to any observer.
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of step a [`ProgressEvent`] reports on.
///
/// The lowercase names are part of the wire format: the `/installdriver`
/// stream prefixes every line with them and UIs switch on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    /// Informational trace, including per-mirror failures that were recovered from.
    Info,
    /// A terminal failure. At most one is emitted per install run.
    Error,
    /// Cumulative byte count after a chunk has been written to disk.
    Downloading,
    /// The archive has been fully written and persisted.
    Downloaded,
    /// An archive entry is about to be extracted.
    Unzipping,
    /// Extraction finished without error.
    Success,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Info => "info",
            EventCategory::Error => "error",
            EventCategory::Downloading => "downloading",
            EventCategory::Downloaded => "downloaded",
            EventCategory::Unzipping => "unzipping",
            EventCategory::Success => "success",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of an install run, tied to the request that triggered it by `event_id`.
///
/// Events are never mutated after emission; sinks receive them by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Caller-supplied correlation identifier.
    #[serde(rename = "eventID")]
    pub event_id: String,
    pub category: EventCategory,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(event_id: impl Into<String>, category: EventCategory, message: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            category,
            message: message.into(),
        }
    }

    /// Renders the event as one plain-text stream line: `<category>: <message>\n`.
    pub fn to_line(&self) -> String {
        format!("{}: {}\n", self.category, self.message)
    }
}
