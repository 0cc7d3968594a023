use std::sync::{Arc, Mutex, PoisonError};

use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }
}

/// Receives user-facing notifications.
pub trait Notifier {
    fn notify(&self, toast: Toast);

    /// Shows a failed action. Cancelled requests stay quiet.
    fn failure(&self, err: &Error) {
        if err.is_cancelled() {
            return;
        }

        tracing::warn!(error = %err, "action failed");
        self.notify(Toast::error(err.user_message()));
    }
}

/// Writes toasts to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Success => tracing::info!("{}", toast.message),
            ToastLevel::Error => tracing::error!("{}", toast.message),
        }
    }
}

/// Keeps every toast; clones share the same list.
#[derive(Clone, Debug, Default)]
pub struct ToastLog {
    toasts: Arc<Mutex<Vec<Toast>>>,
}

impl ToastLog {
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<Toast> {
        self.toasts().pop()
    }
}

impl Notifier for ToastLog {
    fn notify(&self, toast: Toast) {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(toast);
    }
}
