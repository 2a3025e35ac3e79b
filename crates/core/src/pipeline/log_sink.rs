use std::path::PathBuf;
use std::sync::Mutex;

/// Severity of a [`LogEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

/// One progress line about a pointer file.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub pointer_path: PathBuf,
    pub level: LogLevel,
    pub message: String,
}

impl LogEvent {
    pub fn new(pointer_path: impl Into<PathBuf>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            pointer_path: pointer_path.into(),
            level,
            message: message.into(),
        }
    }
}

/// Receives per-file events while a batch runs.
///
/// Delivery is best-effort: the returned batch report stays authoritative,
/// so a sink that drops events loses nothing. Called from worker threads
/// when the batch runs with several jobs.
pub trait LogSink: Send + Sync {
    fn emit(&self, event: &LogEvent);
}

/// Sink that discards all events.
pub struct NullLogSink;

impl LogSink for NullLogSink {
    fn emit(&self, _event: &LogEvent) {}
}

/// Forwards events to the `log` facade.
pub struct LogCrateSink;

impl LogSink for LogCrateSink {
    fn emit(&self, event: &LogEvent) {
        log::log!(
            log::Level::from(event.level),
            "{}: {}",
            event.pointer_path.display(),
            event.message
        );
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Default)]
pub struct CollectingLogSink {
    events: Mutex<Vec<LogEvent>>,
}

impl CollectingLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Events at or above `level`.
    pub fn at_least(&self, level: LogLevel) -> Vec<LogEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.level >= level)
            .collect()
    }
}

impl LogSink for CollectingLogSink {
    fn emit(&self, event: &LogEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sink_is_noop() {
        NullLogSink.emit(&LogEvent::new("a.strm", LogLevel::Error, "boom"));
    }

    #[test]
    fn test_log_crate_sink_accepts_all_levels() {
        for level in [LogLevel::Debug, LogLevel::Info, LogLevel::Warn, LogLevel::Error] {
            LogCrateSink.emit(&LogEvent::new("a.strm", level, "message"));
        }
    }

    #[test]
    fn test_collecting_sink_keeps_order() {
        let sink = CollectingLogSink::new();
        sink.emit(&LogEvent::new("a.strm", LogLevel::Info, "first"));
        sink.emit(&LogEvent::new("b.strm", LogLevel::Error, "second"));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message, "first");
        assert_eq!(events[1].pointer_path, PathBuf::from("b.strm"));
    }

    #[test]
    fn test_at_least_filters_by_level() {
        let sink = CollectingLogSink::new();
        sink.emit(&LogEvent::new("a.strm", LogLevel::Debug, "opening"));
        sink.emit(&LogEvent::new("a.strm", LogLevel::Info, "done"));
        sink.emit(&LogEvent::new("b.strm", LogLevel::Error, "failed"));

        let important = sink.at_least(LogLevel::Info);
        assert_eq!(important.len(), 2);
        assert!(important.iter().all(|e| e.level >= LogLevel::Info));
    }

    #[test]
    fn test_level_maps_to_log_level() {
        assert_eq!(log::Level::from(LogLevel::Warn), log::Level::Warn);
        assert_eq!(log::Level::from(LogLevel::Debug), log::Level::Debug);
    }
}
