//! # Notifications
//!
//! Short-lived messages shown over the dashboard (sign-in failed, order
//! moved, ...). Each one expires five seconds after it was pushed.
//!
//! ```text
//!   push(Error, "Senha inválida") ──► id 7 ──┬── dismiss(7)  → gone
//!                                            └── 5 s later   → pruned by active()
//! ```

use lavapro_core::NOTIFICATION_TTL_SECS;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: Instant,
}

/// Holds the live notifications.
#[derive(Debug)]
pub struct Notifier {
    entries: Mutex<Vec<Notification>>,
    next_id: AtomicU64,
    ttl: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(NOTIFICATION_TTL_SECS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Notifier {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            ttl,
        }
    }

    /// Adds a notification and returns its id.
    pub fn push(&self, kind: NotificationKind, message: impl Into<String>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let message = message.into();
        debug!(id, ?kind, %message, "Notification");
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Notification {
                id,
                kind,
                message,
                created_at: Instant::now(),
            });
        id
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Error, message)
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Info, message)
    }

    /// Removes one notification. Returns false if it was already gone.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|n| n.id != id);
        entries.len() != before
    }

    /// Live notifications, oldest first. Expired ones are dropped.
    pub fn active(&self) -> Vec<Notification> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|n| now.duration_since(n.created_at) < self.ttl);
        entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_notifications_expire_after_five_seconds() {
        let notifier = Notifier::new();
        notifier.error("Credenciais inválidas");

        tokio::time::advance(Duration::from_millis(4_900)).await;
        assert_eq!(notifier.active().len(), 1);

        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(notifier.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss() {
        let notifier = Notifier::new();
        let first = notifier.success("Pedido atualizado");
        notifier.info("Sincronizando");

        assert!(notifier.dismiss(first));
        assert!(!notifier.dismiss(first));
        let active = notifier.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].kind, NotificationKind::Info);
    }
}
