//! Reads host lifecycle events, one name per line

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::events::HostEvent;

use super::EngineCommand;

/// Forward every event line from `reader` to the engine.
///
/// Blank lines and lines that are not valid UTF-8 are skipped. End of input
/// or a read error requests shutdown.
pub async fn forward_events<R>(mut reader: R, cmd_tx: mpsc::Sender<EngineCommand>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                let _ = cmd_tx.send(EngineCommand::Shutdown).await;
                return Err(e).context("Failed to read host event");
            }
        }

        let Ok(line) = std::str::from_utf8(&buf) else {
            warn!("Skipping host event line that is not valid UTF-8");
            continue;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event: HostEvent = match line.parse() {
            Ok(event) => event,
            Err(never) => match never {},
        };
        debug!("Host event received: {}", event);

        if cmd_tx.send(EngineCommand::HostEvent(event)).await.is_err() {
            debug!("Engine gone, no longer reading host events");
            return Ok(());
        }
    }

    info!("Host event stream closed");
    let _ = cmd_tx.send(EngineCommand::Shutdown).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context as TaskContext, Poll};
    use tokio::io::{AsyncRead, BufReader, ReadBuf};

    struct BrokenPipe;

    impl AsyncRead for BrokenPipe {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut TaskContext<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "host went away")))
        }
    }

    fn names(received: &[EngineCommand]) -> Vec<String> {
        received
            .iter()
            .map(|cmd| match cmd {
                EngineCommand::HostEvent(event) => event.to_string(),
                EngineCommand::Shutdown => "<shutdown>".to_string(),
            })
            .collect()
    }

    async fn drain(mut rx: mpsc::Receiver<EngineCommand>) -> Vec<EngineCommand> {
        let mut received = Vec::new();
        while let Some(cmd) = rx.recv().await {
            received.push(cmd);
        }
        received
    }

    #[tokio::test]
    async fn test_forwards_events_then_shutdown() {
        let (tx, rx) = mpsc::channel(16);
        let input: &[u8] = b"PrintStarted\n\n  SettingsUpdated  \nZChange\nPrintDone\n";

        forward_events(input, tx).await.unwrap();

        assert_eq!(
            names(&drain(rx).await),
            ["PrintStarted", "SettingsUpdated", "ZChange", "PrintDone", "<shutdown>"]
        );
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_skipped() {
        let (tx, rx) = mpsc::channel(16);
        let input: &[u8] = b"PrintStarted\n\xff\xfe\nPrintDone\n";

        forward_events(input, tx).await.unwrap();

        assert_eq!(
            names(&drain(rx).await),
            ["PrintStarted", "PrintDone", "<shutdown>"]
        );
    }

    #[tokio::test]
    async fn test_read_error_requests_shutdown() {
        let (tx, rx) = mpsc::channel(16);

        let result = forward_events(BufReader::new(BrokenPipe), tx).await;

        assert!(result.is_err());
        assert_eq!(names(&drain(rx).await), ["<shutdown>"]);
    }

    #[tokio::test]
    async fn test_stops_when_engine_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let input: &[u8] = b"PrintStarted\nPrintDone\n";
        assert!(forward_events(input, tx).await.is_ok());
    }
}
