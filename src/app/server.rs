use super::protocol::{self, JsonRpcNotification};
use crate::remote::{Deliver, DeliveryError, RemoteGate, RemoteLogMessage};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

enum Outbound {
    Line(String),
    Shutdown,
}

/// Queues log notifications for the stdio writer.
///
/// Sending never blocks, so it is safe to call from inside a log call. Once
/// the server has stopped every delivery fails with
/// [`DeliveryError::Disconnected`].
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: mpsc::UnboundedSender<Outbound>,
}

impl std::fmt::Debug for Outbound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outbound::Line(line) => f.debug_tuple("Line").field(line).finish(),
            Outbound::Shutdown => f.write_str("Shutdown"),
        }
    }
}

impl Deliver for Notifier {
    fn deliver(&self, message: &RemoteLogMessage) -> Result<(), DeliveryError> {
        let notification = JsonRpcNotification::log_message(message)
            .map_err(|e| DeliveryError::Encode(e.to_string()))?;
        let line =
            serde_json::to_string(&notification).map_err(|e| DeliveryError::Encode(e.to_string()))?;
        self.sender
            .send(Outbound::Line(line))
            .map_err(|_| DeliveryError::Disconnected)
    }
}

/// Receiving end of the notification queue, consumed by [`StdioServer`].
#[derive(Debug)]
pub struct Outbox {
    sender: mpsc::UnboundedSender<Outbound>,
    receiver: mpsc::UnboundedReceiver<Outbound>,
}

pub fn notification_channel() -> (Notifier, Outbox) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        Notifier {
            sender: sender.clone(),
        },
        Outbox { sender, receiver },
    )
}

/// Line-delimited JSON-RPC server.
///
/// Requests are read one per line. Replies and queued log notifications are
/// written by a single task so lines never interleave.
#[derive(Debug)]
pub struct StdioServer {
    gate: Arc<RemoteGate>,
    outbox: Outbox,
}

impl StdioServer {
    pub fn new(gate: Arc<RemoteGate>, outbox: Outbox) -> Self {
        Self { gate, outbox }
    }

    pub async fn run_stdio(self) -> std::io::Result<()> {
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
            .map(|_| ())
    }

    /// Serve until `reader` reaches end of input. Returns the writer once
    /// everything queued before shutdown has been written.
    pub async fn serve<R, W>(self, reader: R, writer: W) -> std::io::Result<W>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let Outbox { sender, receiver } = self.outbox;
        let writer_task = tokio::spawn(write_loop(receiver, writer));

        info!("Listening for requests on stdin");
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let Some(response) = protocol::handle_line(&self.gate, line) else {
                continue;
            };
            if let Some(error) = &response.error {
                debug!(code = error.code, "Request rejected: {}", error.message);
            }
            match serde_json::to_string(&response) {
                Ok(encoded) => {
                    if sender.send(Outbound::Line(encoded)).is_err() {
                        warn!("Writer stopped; no longer replying");
                        break;
                    }
                }
                Err(e) => warn!("Failed to encode response: {e}"),
            }
        }

        debug!("Input closed, shutting down");
        let _ = sender.send(Outbound::Shutdown);
        writer_task
            .await
            .map_err(|e| std::io::Error::other(format!("writer task failed: {e}")))?
    }
}

async fn write_loop<W>(
    mut receiver: mpsc::UnboundedReceiver<Outbound>,
    mut writer: W,
) -> std::io::Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(outbound) = receiver.recv().await {
        match outbound {
            Outbound::Line(line) => {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Outbound::Shutdown => break,
        }
    }
    Ok(writer)
}
