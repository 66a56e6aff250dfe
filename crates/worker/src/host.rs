//! Host directives.
//!
//! The worker never manipulates pages or notification surfaces itself; it
//! asks the host runtime to, through the [`Host`] trait. The stdio transport
//! implementation frames each directive as one [`OutboundFrame`] line; tests
//! substitute a recording implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shellcache_core::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::events::OutboundFrame;

/// Notification appearance and metadata, as handed to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    pub badge: String,
    /// Vibration pattern in milliseconds (on, off, on, ...).
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
}

/// Opaque metadata carried on a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationData {
    /// Unix milliseconds at which the push event arrived.
    pub date_of_arrival: i64,
    pub primary_key: u32,
}

/// Directives the worker can issue to its host runtime.
#[async_trait]
pub trait Host: Send + Sync {
    /// Skip any waiting period and activate this worker generation now.
    async fn skip_waiting(&self) -> Result<(), Error>;

    /// Route all currently open pages to this generation immediately.
    async fn claim_clients(&self) -> Result<(), Error>;

    /// Display a notification.
    async fn show_notification(&self, title: &str, options: NotificationOptions) -> Result<(), Error>;
}

/// Host implementation that frames directives onto the outbound channel.
///
/// The channel is drained by [`write_frames`], which owns stdout.
pub struct ChannelHost {
    tx: mpsc::Sender<OutboundFrame>,
}

impl ChannelHost {
    pub fn new(tx: mpsc::Sender<OutboundFrame>) -> Self {
        Self { tx }
    }

    async fn send(&self, frame: OutboundFrame) -> Result<(), Error> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| Error::Transport("host channel closed".to_string()))
    }
}

#[async_trait]
impl Host for ChannelHost {
    async fn skip_waiting(&self) -> Result<(), Error> {
        self.send(OutboundFrame::SkipWaiting).await
    }

    async fn claim_clients(&self) -> Result<(), Error> {
        self.send(OutboundFrame::ClaimClients).await
    }

    async fn show_notification(&self, title: &str, options: NotificationOptions) -> Result<(), Error> {
        self.send(OutboundFrame::Notification { title: title.to_string(), options })
            .await
    }
}

/// Drain outbound frames to stdout, one JSON line each.
///
/// Runs until every sender is dropped. Frames that fail to encode are logged
/// and skipped; a stdout write failure ends the loop since nothing downstream
/// can be delivered anymore.
pub async fn write_frames(mut rx: mpsc::Receiver<OutboundFrame>) {
    let mut stdout = tokio::io::stdout();

    while let Some(frame) = rx.recv().await {
        let mut line = match serde_json::to_string(&frame) {
            Ok(line) => line,
            Err(err) => {
                tracing::error!(error = %err, "failed to encode outbound frame");
                continue;
            }
        };
        line.push('\n');

        if let Err(err) = stdout.write_all(line.as_bytes()).await {
            tracing::error!(error = %err, "stdout write failed; stopping frame writer");
            break;
        }
        if let Err(err) = stdout.flush().await {
            tracing::error!(error = %err, "stdout flush failed; stopping frame writer");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_host_frames_directives() {
        let (tx, mut rx) = mpsc::channel(4);
        let host = ChannelHost::new(tx);

        host.skip_waiting().await.unwrap();
        host.claim_clients().await.unwrap();

        assert!(matches!(rx.recv().await.unwrap(), OutboundFrame::SkipWaiting));
        assert!(matches!(rx.recv().await.unwrap(), OutboundFrame::ClaimClients));
    }

    #[tokio::test]
    async fn test_channel_host_notification() {
        let (tx, mut rx) = mpsc::channel(4);
        let host = ChannelHost::new(tx);

        let options = NotificationOptions {
            body: "New update available".into(),
            icon: "./icon-192.png".into(),
            badge: "./icon-192.png".into(),
            vibrate: vec![100, 50, 100],
            data: NotificationData { date_of_arrival: 0, primary_key: 1 },
        };
        host.show_notification("Retirement Calculator", options).await.unwrap();

        match rx.recv().await.unwrap() {
            OutboundFrame::Notification { title, options } => {
                assert_eq!(title, "Retirement Calculator");
                assert_eq!(options.vibrate, vec![100, 50, 100]);
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_channel_host_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let host = ChannelHost::new(tx);
        assert!(matches!(host.skip_waiting().await, Err(Error::Transport(_))));
    }
}
