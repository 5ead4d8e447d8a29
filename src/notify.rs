//! Notification channel for the presentation layer
//!
//! The latest message is published on a `tokio::sync::watch` channel. Each
//! message clears itself after a fixed delay unless a newer one replaced it.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

pub const DEFAULT_CLEAR_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub show: bool,
    pub message: String,
    pub severity: Severity,
}

#[derive(Clone)]
pub struct NotificationCenter {
    sender: Arc<watch::Sender<Notification>>,
    sequence: Arc<AtomicU64>,
    clear_after: Duration,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_CLEAR_DELAY)
    }
}

impl NotificationCenter {
    pub fn new(clear_after: Duration) -> Self {
        let (sender, _) = watch::channel(Notification::default());
        Self {
            sender: Arc::new(sender),
            sequence: Arc::new(AtomicU64::new(0)),
            clear_after,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn current(&self) -> Notification {
        self.sender.borrow().clone()
    }

    /// Publish a message. Outside a tokio runtime the message stays until the
    /// next `show` or `clear`.
    pub fn show(&self, message: impl Into<String>, severity: Severity) {
        let message = message.into();
        match severity {
            Severity::Error => warn!("{}", message),
            Severity::Info | Severity::Success => info!("{}", message),
        }

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.sender.send_replace(Notification {
            show: true,
            message,
            severity,
        });

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let sender = Arc::clone(&self.sender);
            let latest = Arc::clone(&self.sequence);
            let delay = self.clear_after;
            handle.spawn(async move {
                tokio::time::sleep(delay).await;
                if latest.load(Ordering::SeqCst) == sequence {
                    sender.send_replace(Notification::default());
                }
            });
        }
    }

    pub fn clear(&self) {
        self.sequence.fetch_add(1, Ordering::SeqCst);
        self.sender.send_replace(Notification::default());
    }
}
