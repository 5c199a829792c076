use std::fmt;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// How long a notice stays on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeDuration {
    Short,
    Long,
}

/// Transient user-visible message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub duration: NoticeDuration,
}

impl Notice {
    pub fn short<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            duration: NoticeDuration::Short,
        }
    }

    pub fn long<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            duration: NoticeDuration::Long,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Shows notices to the user. Must not block.
pub trait Notifier: Send + Sync {
    fn show(&self, notice: Notice);
}

/// Notifier that only writes notices to the log
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show(&self, notice: Notice) {
        info!(duration = ?notice.duration, "{}", notice.message);
    }
}

/// Notifier that forwards notices to a channel for a UI to render
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn show(&self, notice: Notice) {
        if let Err(e) = self.sender.send(notice) {
            warn!("Notice dropped, no receiver: {}", e.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_notifier_forwards_notices() {
        let (notifier, mut receiver) = ChannelNotifier::new();
        notifier.show(Notice::short("Flash Enable"));
        notifier.show(Notice::long("Pic captured at /tmp/x.jpg"));

        let first = receiver.recv().await.unwrap();
        assert_eq!(first.message, "Flash Enable");
        assert_eq!(first.duration, NoticeDuration::Short);

        let second = receiver.recv().await.unwrap();
        assert_eq!(second.duration, NoticeDuration::Long);
    }

    #[test]
    fn test_channel_notifier_without_receiver_does_not_panic() {
        let (notifier, receiver) = ChannelNotifier::new();
        drop(receiver);
        notifier.show(Notice::short("ignored"));
    }
}
