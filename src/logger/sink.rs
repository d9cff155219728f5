use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

/// Destination for encoded log lines.
///
/// Each call receives exactly one complete, newline-terminated event. The
/// process logger serializes calls, so implementations need no locking of
/// their own for correctness.
pub trait LogSink: Send {
    fn name(&self) -> &'static str;

    fn write_line(&mut self, line: &[u8]) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Mirrors log output to stderr. Stdout is reserved for the protocol.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        let mut stderr = io::stderr().lock();
        stderr.write_all(line)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// In-memory sink whose contents can be inspected through any clone.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.buffer.lock().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.buffer.lock())
            .lines()
            .map(str::to_owned)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }
}

impl LogSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        self.buffer.lock().extend_from_slice(line);
        Ok(())
    }
}

/// Sink that fails every write. Used to exercise error paths.
#[derive(Debug, Default)]
pub struct FailingSink;

impl LogSink for FailingSink {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn write_line(&mut self, _line: &[u8]) -> io::Result<()> {
        Err(io::Error::other("sink unavailable"))
    }
}
