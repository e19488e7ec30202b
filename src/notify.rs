// src/notify.rs

//! User-facing signals emitted by long-running workflows.
//!
//! Both sinks are fire-and-forget and may be called from any worker
//! thread. A GUI implementation is responsible for marshaling the call back
//! onto its own UI thread.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::types::NoticeLevel;

/// Toast/dialog style notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// Step-level progress, e.g. ticking a checkbox in a progress list.
pub trait ProgressSink: Send + Sync {
    fn step_completed(&self, step: &str);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, level: NoticeLevel, message: &str) {
        (**self).notify(level, message)
    }
}

impl<P: ProgressSink + ?Sized> ProgressSink for Arc<P> {
    fn step_completed(&self, step: &str) {
        (**self).step_completed(step)
    }
}

/// Notifier that writes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => info!(target: "repairkit::notice", "{message}"),
            NoticeLevel::Warning => warn!(target: "repairkit::notice", "{message}"),
            NoticeLevel::Error => error!(target: "repairkit::notice", "{message}"),
        }
    }
}

/// Progress sink that writes completed steps to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn step_completed(&self, step: &str) {
        info!(target: "repairkit::progress", step, "step completed");
    }
}
