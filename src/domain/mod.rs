//! Domain layer.
//!
//! Contains the types shared by the logger, the remote gate and the
//! configuration resolver:
//! - `Severity`: the single ranked level table
//! - `LogEvent`: one immutable log call with optional structured fields

pub mod log_event;
pub mod severity;

pub use log_event::{Fields, LogEvent};
pub use severity::{Severity, SeverityError};
