//! Transient notifications raised by submissions and saves.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

pub const TOAST_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl ToastKind {
    pub const fn label(self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub expires_at: Instant,
}

/// Toasts expire on their own; readers only ever see the live ones.
#[derive(Debug)]
pub struct Toasts {
    ttl: Duration,
    next_id: AtomicU64,
    live: Mutex<Vec<Toast>>,
}

impl Default for Toasts {
    fn default() -> Self {
        Self::with_ttl(TOAST_TTL)
    }
}

impl Toasts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            next_id: AtomicU64::new(1),
            live: Mutex::new(Vec::new()),
        }
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.push(ToastKind::Success, message.into())
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.push(ToastKind::Error, message.into())
    }

    pub fn active(&self) -> Vec<Toast> {
        let now = Instant::now();
        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        live.retain(|toast| toast.expires_at > now);
        live.clone()
    }

    pub fn dismiss(&self, id: u64) {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|toast| toast.id != id);
    }

    fn push(&self, kind: ToastKind, message: String) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let toast = Toast {
            id,
            kind,
            message,
            expires_at: Instant::now() + self.ttl,
        };
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(toast);
        id
    }
}
