use super::rotating::RotatingFileWriter;
use super::sink::{ConsoleSink, LogSink};
use crate::app::config::RotationConfig;
use crate::domain::{LogEvent, Severity};
use parking_lot::Mutex;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Failed to open log file {path}: {source}")]
    SinkInit {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to replay buffered log output into {sink} sink: {source}")]
    Drain {
        sink: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Everything needed to leave the buffering phase.
#[derive(Debug, Clone, Default)]
pub struct LoggerSettings {
    pub log_path: Option<PathBuf>,
    pub min_severity: Severity,
    pub console: bool,
    pub rotation: RotationConfig,
}

impl LoggerSettings {
    fn build_sinks(&self) -> Result<Vec<Box<dyn LogSink>>, LoggerError> {
        let mut sinks: Vec<Box<dyn LogSink>> = Vec::with_capacity(2);

        if let Some(path) = &self.log_path {
            let writer = RotatingFileWriter::open(path, self.rotation.clone()).map_err(|source| {
                LoggerError::SinkInit {
                    path: path.clone(),
                    source,
                }
            })?;
            sinks.push(Box::new(writer));
        }

        if self.console {
            sinks.push(Box::new(ConsoleSink));
        }

        Ok(sinks)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Initialization {
    Completed { drained_bytes: usize },
    AlreadyInitialized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    Buffering,
    Initialized,
}

enum Phase {
    Buffering {
        buffer: Vec<u8>,
        console: Option<Box<dyn LogSink>>,
    },
    Initialized {
        sinks: Vec<Box<dyn LogSink>>,
        min_severity: Severity,
    },
}

/// Process-wide log writer.
///
/// Starts out buffering: every event is kept in memory (and mirrored to the
/// console) until [`ProcessLogger::initialize`] opens the real sinks. The
/// buffered output is then replayed into the new sinks, in order, before any
/// later event can reach them. A single lock guards the phase and the sinks,
/// so lines from concurrent callers never interleave.
pub struct ProcessLogger {
    phase: Mutex<Phase>,
    // Fast-path copy of the minimum rank; zero while buffering.
    min_rank: AtomicU8,
}

impl std::fmt::Debug for ProcessLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessLogger")
            .field("phase", &self.phase())
            .field("min_rank", &self.min_rank.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for ProcessLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessLogger {
    /// A buffering logger that mirrors to stderr.
    pub fn new() -> Self {
        Self::with_buffer_console(Some(Box::new(ConsoleSink)))
    }

    /// A buffering logger with a custom (or no) console mirror.
    pub fn with_buffer_console(console: Option<Box<dyn LogSink>>) -> Self {
        Self {
            phase: Mutex::new(Phase::Buffering {
                buffer: Vec::new(),
                console,
            }),
            min_rank: AtomicU8::new(0),
        }
    }

    pub fn phase(&self) -> PhaseKind {
        match &*self.phase.lock() {
            Phase::Buffering { .. } => PhaseKind::Buffering,
            Phase::Initialized { .. } => PhaseKind::Initialized,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.phase() == PhaseKind::Initialized
    }

    /// The active minimum, or `None` while buffering (nothing is filtered).
    pub fn min_severity(&self) -> Option<Severity> {
        Severity::from_rank(self.min_rank.load(Ordering::Acquire))
    }

    /// Whether an event of this severity would currently be written.
    pub fn enabled(&self, severity: Severity) -> bool {
        severity.rank() >= self.min_rank.load(Ordering::Acquire)
    }

    pub fn log(&self, event: &LogEvent) {
        if !self.enabled(event.severity) {
            return;
        }

        let line = event.to_json_line();
        let mut phase = self.phase.lock();
        match &mut *phase {
            Phase::Buffering { buffer, console } => {
                buffer.extend_from_slice(&line);
                if let Some(console) = console
                    && let Err(e) = console.write_line(&line)
                {
                    eprintln!("Warning: failed to write to {} sink: {e}", console.name());
                }
            }
            Phase::Initialized {
                sinks,
                min_severity,
            } => {
                // Re-checked under the lock: the fast path may have raced
                // the transition.
                if !event.severity.passes(*min_severity) {
                    return;
                }
                for sink in sinks {
                    if let Err(e) = sink.write_line(&line) {
                        eprintln!("Warning: failed to write to {} sink: {e}", sink.name());
                    }
                }
            }
        }
    }

    /// Open the configured sinks and leave the buffering phase.
    ///
    /// Calling this again after a successful transition does nothing. If a
    /// sink cannot be opened the logger keeps buffering.
    pub fn initialize(&self, settings: &LoggerSettings) -> Result<Initialization, LoggerError> {
        let mut phase = self.phase.lock();
        if matches!(*phase, Phase::Initialized { .. }) {
            return Ok(Initialization::AlreadyInitialized);
        }

        let sinks = settings.build_sinks()?;
        self.transition(&mut phase, sinks, settings.min_severity)
    }

    /// Like [`initialize`](Self::initialize), with caller-provided sinks.
    pub fn initialize_with_sinks(
        &self,
        sinks: Vec<Box<dyn LogSink>>,
        min_severity: Severity,
    ) -> Result<Initialization, LoggerError> {
        let mut phase = self.phase.lock();
        if matches!(*phase, Phase::Initialized { .. }) {
            return Ok(Initialization::AlreadyInitialized);
        }
        self.transition(&mut phase, sinks, min_severity)
    }

    fn transition(
        &self,
        phase: &mut Phase,
        mut sinks: Vec<Box<dyn LogSink>>,
        min_severity: Severity,
    ) -> Result<Initialization, LoggerError> {
        let buffer = match phase {
            Phase::Buffering { buffer, .. } => std::mem::take(buffer),
            Phase::Initialized { .. } => return Ok(Initialization::AlreadyInitialized),
        };

        let mut drain_error = None;
        for sink in &mut sinks {
            if let Err(source) = drain_into(sink.as_mut(), &buffer) {
                drain_error.get_or_insert(LoggerError::Drain {
                    sink: sink.name(),
                    source,
                });
            }
        }

        self.min_rank.store(min_severity.rank(), Ordering::Release);
        *phase = Phase::Initialized {
            sinks,
            min_severity,
        };

        match drain_error {
            Some(e) => Err(e),
            None => Ok(Initialization::Completed {
                drained_bytes: buffer.len(),
            }),
        }
    }

    pub fn flush(&self) {
        let mut phase = self.phase.lock();
        let sinks: Vec<&mut Box<dyn LogSink>> = match &mut *phase {
            Phase::Buffering { console, .. } => console.iter_mut().collect(),
            Phase::Initialized { sinks, .. } => sinks.iter_mut().collect(),
        };
        for sink in sinks {
            if let Err(e) = sink.flush() {
                eprintln!("Warning: failed to flush {} sink: {e}", sink.name());
            }
        }
    }
}

fn drain_into(sink: &mut dyn LogSink, buffer: &[u8]) -> io::Result<()> {
    for line in buffer.split_inclusive(|b| *b == b'\n') {
        sink.write_line(line)?;
    }
    sink.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::sink::{FailingSink, MemorySink};
    use serde_json::Value;
    use tempfile::TempDir;

    fn quiet() -> ProcessLogger {
        ProcessLogger::with_buffer_console(None)
    }

    fn messages(sink: &MemorySink) -> Vec<String> {
        sink.lines()
            .iter()
            .map(|l| {
                let v: Value = serde_json::from_str(l).unwrap();
                v["message"].as_str().unwrap().to_string()
            })
            .collect()
    }

    #[test]
    fn test_starts_buffering_without_filter() {
        let logger = quiet();
        assert_eq!(logger.phase(), PhaseKind::Buffering);
        assert_eq!(logger.min_severity(), None);
        assert!(logger.enabled(Severity::Debug));
    }

    #[test]
    fn test_buffered_events_are_replayed_in_order() {
        let logger = quiet();
        logger.log(&LogEvent::new(Severity::Debug, "one"));
        logger.log(&LogEvent::new(Severity::Info, "two"));

        let sink = MemorySink::new();
        let result = logger
            .initialize_with_sinks(vec![Box::new(sink.clone())], Severity::Info)
            .unwrap();
        assert!(matches!(result, Initialization::Completed { drained_bytes } if drained_bytes > 0));

        logger.log(&LogEvent::new(Severity::Info, "three"));
        logger.log(&LogEvent::new(Severity::Debug, "dropped"));

        // Buffered events are kept even below the threshold chosen later.
        assert_eq!(messages(&sink), vec!["one", "two", "three"]);
        assert_eq!(logger.min_severity(), Some(Severity::Info));
    }

    #[test]
    fn test_second_initialize_is_noop() {
        let logger = quiet();
        logger.log(&LogEvent::new(Severity::Info, "buffered"));

        let first = MemorySink::new();
        let second = MemorySink::new();
        logger
            .initialize_with_sinks(vec![Box::new(first.clone())], Severity::Debug)
            .unwrap();
        let again = logger
            .initialize_with_sinks(vec![Box::new(second.clone())], Severity::Error)
            .unwrap();

        assert_eq!(again, Initialization::AlreadyInitialized);
        assert!(second.is_empty());
        assert_eq!(logger.min_severity(), Some(Severity::Debug));
        assert_eq!(messages(&first), vec!["buffered"]);
    }

    #[test]
    fn test_console_mirror_while_buffering() {
        let console = MemorySink::new();
        let logger = ProcessLogger::with_buffer_console(Some(Box::new(console.clone())));

        logger.log(&LogEvent::new(Severity::Notice, "early"));

        assert_eq!(messages(&console), vec!["early"]);
    }

    #[test]
    fn test_drain_failure_still_initializes() {
        let logger = quiet();
        logger.log(&LogEvent::new(Severity::Info, "buffered"));

        let healthy = MemorySink::new();
        let err = logger
            .initialize_with_sinks(
                vec![Box::new(FailingSink), Box::new(healthy.clone())],
                Severity::Info,
            )
            .unwrap_err();

        assert!(matches!(err, LoggerError::Drain { sink: "failing", .. }));
        assert!(logger.is_initialized());
        assert_eq!(messages(&healthy), vec!["buffered"]);
    }

    #[test]
    fn test_sink_open_failure_keeps_buffering() {
        let temp = TempDir::new().unwrap();
        // A regular file where a directory is needed.
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        let logger = quiet();
        logger.log(&LogEvent::new(Severity::Info, "kept"));

        let settings = LoggerSettings {
            log_path: Some(blocker.join("app.log")),
            ..LoggerSettings::default()
        };
        let err = logger.initialize(&settings).unwrap_err();
        assert!(matches!(err, LoggerError::SinkInit { .. }));
        assert_eq!(logger.phase(), PhaseKind::Buffering);

        let sink = MemorySink::new();
        logger
            .initialize_with_sinks(vec![Box::new(sink.clone())], Severity::Info)
            .unwrap();
        assert_eq!(messages(&sink), vec!["kept"]);
    }

    #[test]
    fn test_initialize_writes_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("logs").join("app.log");

        let logger = quiet();
        logger.log(&LogEvent::new(Severity::Debug, "before"));
        logger
            .initialize(&LoggerSettings {
                log_path: Some(path.clone()),
                min_severity: Severity::Warning,
                console: false,
                rotation: RotationConfig::default(),
            })
            .unwrap();
        logger.log(&LogEvent::new(Severity::Info, "filtered"));
        logger.log(&LogEvent::new(Severity::Error, "after"));
        logger.flush();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"before\""));
        assert!(lines[1].contains("\"after\""));
    }

    #[test]
    fn test_sink_write_failure_does_not_abort() {
        let logger = quiet();
        let healthy = MemorySink::new();
        logger
            .initialize_with_sinks(
                vec![Box::new(FailingSink), Box::new(healthy.clone())],
                Severity::Debug,
            )
            .unwrap();

        logger.log(&LogEvent::new(Severity::Info, "still written"));
        assert_eq!(messages(&healthy), vec!["still written"]);
    }
}
