pub mod config;
pub mod protocol;
pub mod server;
pub mod subscriber;

pub use config::{
    Cli, ConfigError, ConfigResolver, ConfigSnapshot, OutputConfig, RotationConfig, ServerTarget,
};
pub use server::{Notifier, Outbox, StdioServer, notification_channel};
pub use subscriber::init_tracing;

use crate::domain::Fields;
use crate::error::AppError;
use crate::logger::{Initialization, Logger, LoggerError, LoggerSettings, ProcessLogger};
use crate::remote::{RemoteForwarder, RemoteGate};
use clap::Parser;
use clap::error::ErrorKind;
use config::{SourceOutcome, SourceReport};
use serde_json::json;
use std::process;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The logger, remote gate and notification queue, wired together.
///
/// Built before configuration is resolved so that everything logged during
/// startup lands in the buffered prefix.
#[derive(Debug)]
pub struct LoggingStack {
    pub process: Arc<ProcessLogger>,
    pub gate: Arc<RemoteGate>,
    pub logger: Logger,
    outbox: Outbox,
}

impl LoggingStack {
    pub fn new(process: Arc<ProcessLogger>, output: &OutputConfig) -> Self {
        let gate = Arc::new(RemoteGate::default());
        let (notifier, outbox) = notification_channel();

        let mut logger = Logger::new(Arc::clone(&process));
        if output.remote_logging {
            logger = logger.with_remote(RemoteForwarder::new(Arc::clone(&gate), Arc::new(notifier)));
        }

        Self {
            process,
            gate,
            logger,
            outbox,
        }
    }

    /// A stack for `output`, mirroring to stderr while buffering unless the
    /// console is disabled.
    pub fn for_output(output: &OutputConfig) -> Self {
        let process = if output.console {
            ProcessLogger::new()
        } else {
            ProcessLogger::with_buffer_console(None)
        };
        Self::new(Arc::new(process), output)
    }
}

pub struct App {
    snapshot: ConfigSnapshot,
    target: ServerTarget,
    stack: LoggingStack,
}

impl App {
    pub fn from_args<I, T>(args: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::from_args(args)?;
        Self::from_cli(&cli)
    }

    /// Build the logging stack, install it as the global `tracing`
    /// subscriber and resolve configuration.
    pub fn from_cli(cli: &Cli) -> Result<Self, AppError> {
        let stack = LoggingStack::for_output(&cli.output());
        if let Err(e) = init_tracing(stack.logger.clone()) {
            eprintln!("Warning: {e}, tracing events will not be logged");
        }
        Self::bootstrap(cli, &ConfigResolver::default(), stack)
    }

    /// Resolve configuration, leave the buffering phase and validate the
    /// server target.
    pub fn bootstrap(
        cli: &Cli,
        resolver: &ConfigResolver,
        stack: LoggingStack,
    ) -> Result<Self, AppError> {
        let output = cli.output();
        let config_log = stack.logger.named("config");

        config_log.info("Loading configurations...");
        let resolution = resolver.resolve(cli.overrides());
        for entry in &resolution.report {
            log_source(&config_log, entry);
        }
        let snapshot = resolution.snapshot;

        let settings = LoggerSettings {
            log_path: snapshot.log_path.clone(),
            min_severity: snapshot.min_severity(),
            console: output.console,
            rotation: output.rotation,
        };
        match stack.process.initialize(&settings) {
            Ok(Initialization::Completed { drained_bytes }) => {
                debug!(drained_bytes, "Logger initialized");
            }
            Ok(Initialization::AlreadyInitialized) => debug!("Logger was already initialized"),
            Err(e @ LoggerError::Drain { .. }) => warn!("{e}"),
            Err(e) => return Err(e.into()),
        }

        let target = snapshot.server_target()?;

        match &target {
            ServerTarget::Executable(path) => info!("Using inventory CLI at {}", path.display()),
            ServerTarget::Remote(address) => info!("Using inventory web server at {address}"),
        }
        if snapshot.is_debug_mode() {
            debug!("Debug logging enabled");
        }

        Ok(Self {
            snapshot,
            target,
            stack,
        })
    }

    pub fn snapshot(&self) -> &ConfigSnapshot {
        &self.snapshot
    }

    pub fn target(&self) -> &ServerTarget {
        &self.target
    }

    pub fn logger(&self) -> &Logger {
        &self.stack.logger
    }

    pub fn gate(&self) -> &Arc<RemoteGate> {
        &self.stack.gate
    }

    pub fn into_server(self) -> StdioServer {
        StdioServer::new(self.stack.gate, self.stack.outbox)
    }

    pub async fn run(self) -> Result<(), AppError> {
        info!("Starting wtinventory-mcp v{}", crate::VERSION);
        let process = Arc::clone(&self.stack.process);

        self.into_server().run_stdio().await?;

        info!("wtinventory-mcp stopped.");
        process.flush();
        Ok(())
    }
}

fn log_source(logger: &Logger, entry: &SourceReport) {
    let mut fields = Fields::new();
    fields.insert("source".to_string(), json!(entry.source.kind.as_str()));
    fields.insert("path".to_string(), json!(entry.source.path.display().to_string()));

    match &entry.outcome {
        SourceOutcome::Absent => logger.debug_with_fields("Config source not found", fields),
        SourceOutcome::Merged { fields: applied } => {
            fields.insert("applied".to_string(), json!(applied));
            logger.debug_with_fields("Config source merged", fields);
        }
        SourceOutcome::Unparsable { error } => {
            fields.insert("error".to_string(), json!(error));
            logger.debug_with_fields("Config source skipped", fields);
        }
    }
}

// Main entry point for the application
pub async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.print()?;
            return Ok(());
        }
        Err(e) => e.exit(),
    };
    if let Err(e) = cli.validate() {
        eprintln!("Configuration error: {e}");
        process::exit(1);
    }

    match App::from_cli(&cli) {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("Application error: {}", e);
                process::exit(1);
            }
        }
        Err(e) => {
            error!("Failed to load server: {}", e);
            process::exit(1);
        }
    }

    Ok(())
}
