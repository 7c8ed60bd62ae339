//! Transient viewer notifications (the terminal equivalent of a toast).

use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

/// Sending half handed to anything that needs to tell the viewer something
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

pub type Notifications = mpsc::UnboundedReceiver<Notification>;

pub fn channel() -> (Notifier, Notifications) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Notifier { tx }, rx)
}

impl Notifier {
    pub fn info(&self, message: impl Into<String>) {
        self.send(Level::Info, message.into());
    }

    pub fn success(&self, message: impl Into<String>) {
        self.send(Level::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(Level::Error, message.into());
    }

    fn send(&self, level: Level, message: String) {
        match level {
            Level::Error => warn!("{}", message),
            _ => info!("{}", message),
        }
        // Nobody listening is fine; the message is already logged
        let _ = self.tx.send(Notification { level, message });
    }
}

/// Everything queued so far, without waiting
pub fn drain(notifications: &mut Notifications) -> Vec<Notification> {
    let mut drained = Vec::new();
    while let Ok(notification) = notifications.try_recv() {
        drained.push(notification);
    }
    drained
}
