//! Progress sinks: where install events go.
//!
//! The pipeline never knows which transport is listening. It is handed a
//! [`ProgressSink`] and emits into it; a sink that cannot deliver an event
//! drops it instead of failing or blocking the install.

#[cfg(test)]
use std::sync::Mutex;

use colored::Colorize;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::libs::utilities::misc_utils::human_readable_size;
use crate::schemas::progress::{EventCategory, ProgressEvent};
use crate::{log_debug, log_error, log_info};

/// Consumer of install progress events.
///
/// `emit` is fire-and-forget: implementations must not block for long and
/// must swallow their own delivery failures.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Forwards events to the application log.
#[derive(Debug, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn emit(&self, event: ProgressEvent) {
        match event.category {
            EventCategory::Error => log_error!("[{}] {}", event.event_id, event.message),
            EventCategory::Downloading | EventCategory::Unzipping => {
                log_debug!("[{}] {}: {}", event.event_id, event.category, event.message)
            }
            _ => log_info!("[{}] {}: {}", event.event_id, event.category, event.message),
        }
    }
}

/// Prints events as lines on stdout for the `install` command.
///
/// `downloading` counts are rendered as human-readable sizes and
/// `unzipping` lines are only shown in verbose mode, since a driver bundle
/// has thousands of entries.
#[derive(Debug, Default)]
pub struct TerminalSink {
    pub verbose: bool,
}

impl ProgressSink for TerminalSink {
    fn emit(&self, event: ProgressEvent) {
        let label = match event.category {
            EventCategory::Error => event.category.as_str().red().bold(),
            EventCategory::Success | EventCategory::Downloaded => event.category.as_str().green(),
            EventCategory::Info => event.category.as_str().cyan(),
            _ => event.category.as_str().dimmed(),
        };
        match event.category {
            EventCategory::Downloading => {
                let rendered = event
                    .message
                    .parse::<u64>()
                    .map(human_readable_size)
                    .unwrap_or_else(|_| event.message.clone());
                println!("{label}: {rendered}");
            }
            EventCategory::Unzipping if !self.verbose => {}
            _ => println!("{label}: {}", event.message),
        }
    }
}

/// Sends events over an unbounded channel, e.g. into a streaming HTTP body.
///
/// Sending never blocks. Once the receiver is gone the events are dropped
/// and, when a token is attached, the install is cancelled since nobody is
/// listening any more.
#[derive(Debug)]
pub struct ChannelSink {
    sender: UnboundedSender<ProgressEvent>,
    on_disconnect: Option<CancellationToken>,
}

impl ChannelSink {
    pub fn new(sender: UnboundedSender<ProgressEvent>) -> Self {
        Self {
            sender,
            on_disconnect: None,
        }
    }

    pub fn cancel_on_disconnect(mut self, token: CancellationToken) -> Self {
        self.on_disconnect = Some(token);
        self
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) {
        if self.sender.send(event).is_err() {
            if let Some(token) = &self.on_disconnect {
                if !token.is_cancelled() {
                    log_debug!("[Progress] Receiver dropped, cancelling install");
                    token.cancel();
                }
            }
        }
    }
}

/// Records every event in memory, in emission order.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<ProgressEvent>>,
}

#[cfg(test)]
impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn categories(&self) -> Vec<EventCategory> {
        self.events().iter().map(|event| event.category).collect()
    }
}

#[cfg(test)]
impl ProgressSink for MemorySink {
    fn emit(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Delivers every event to two sinks, first then second.
#[derive(Debug, Default)]
pub struct TeeSink<A, B> {
    first: A,
    second: B,
}

impl<A: ProgressSink, B: ProgressSink> TeeSink<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: ProgressSink, B: ProgressSink> ProgressSink for TeeSink<A, B> {
    fn emit(&self, event: ProgressEvent) {
        self.first.emit(event.clone());
        self.second.emit(event);
    }
}

/// Binds a sink to one correlation id so pipeline steps only pass category and message.
#[derive(Clone, Copy)]
pub struct Reporter<'a> {
    event_id: &'a str,
    sink: &'a dyn ProgressSink,
}

impl<'a> Reporter<'a> {
    pub fn new(event_id: &'a str, sink: &'a dyn ProgressSink) -> Self {
        Self { event_id, sink }
    }

    pub fn emit(&self, category: EventCategory, message: impl Into<String>) {
        self.sink
            .emit(ProgressEvent::new(self.event_id, category, message));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(EventCategory::Info, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(EventCategory::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn test_reporter_tags_events_with_event_id() {
        let sink = MemorySink::new();
        let reporter = Reporter::new("req-1", &sink);
        reporter.info("hello");
        reporter.emit(EventCategory::Downloading, "10");

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|event| event.event_id == "req-1"));
        assert_eq!(sink.categories(), vec![EventCategory::Info, EventCategory::Downloading]);
    }

    #[test]
    fn test_channel_sink_delivers_in_order() {
        let (tx, mut rx) = unbounded_channel();
        let sink = ChannelSink::new(tx);
        sink.emit(ProgressEvent::new("a", EventCategory::Info, "one"));
        sink.emit(ProgressEvent::new("a", EventCategory::Success, "two"));

        assert_eq!(rx.try_recv().unwrap().message, "one");
        assert_eq!(rx.try_recv().unwrap().message, "two");
    }

    #[test]
    fn test_channel_sink_cancels_when_receiver_dropped() {
        let (tx, rx) = unbounded_channel();
        let token = CancellationToken::new();
        let sink = ChannelSink::new(tx).cancel_on_disconnect(token.clone());
        drop(rx);

        sink.emit(ProgressEvent::new("a", EventCategory::Info, "lost"));
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_tee_sink_feeds_both_sides() {
        let (tx, mut rx) = unbounded_channel();
        let sink = TeeSink::new(ChannelSink::new(tx), MemorySink::new());
        Reporter::new("t", &sink).info("both");

        assert_eq!(rx.try_recv().unwrap().message, "both");
        assert_eq!(sink.second.events().len(), 1);
    }
}
