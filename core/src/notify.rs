//! Toast notifications.
//!
//! Components fire toasts through `NotificationService` and never wait on
//! them. `ToastQueue` buffers them for a host to drain and display.

use std::cell::RefCell;
use std::fmt;

use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToastKind::Success => f.write_str("success"),
            ToastKind::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub kind: ToastKind,
}

pub trait NotificationService {
    fn show_toast(&self, title: &str, message: &str, kind: ToastKind);
}

/// FIFO of toasts waiting to be shown.
#[derive(Debug, Default)]
pub struct ToastQueue {
    pending: RefCell<Vec<Toast>>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return every queued toast, oldest first.
    pub fn drain(&self) -> Vec<Toast> {
        self.pending.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }
}

impl NotificationService for ToastQueue {
    fn show_toast(&self, title: &str, message: &str, kind: ToastKind) {
        info!(%kind, title, message, "toast");
        self.pending.borrow_mut().push(Toast {
            title: title.to_string(),
            message: message.to_string(),
            kind,
        });
    }
}
