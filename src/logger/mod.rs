pub mod handle;
pub mod layer;
pub mod process;
pub mod rotating;
pub mod sink;

pub use handle::Logger;
pub use layer::ProcessLoggerLayer;
pub use process::{Initialization, LoggerError, LoggerSettings, PhaseKind, ProcessLogger};
pub use rotating::RotatingFileWriter;
pub use sink::{ConsoleSink, FailingSink, LogSink, MemorySink};
