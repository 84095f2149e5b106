//! Structured reporting seam for non-fatal failures and notable events.
//!
//! Handlers never write to a log directly for the conditions listed in
//! [`Diagnostic`]; they report through a [`DiagnosticSink`]. Production hosts
//! use [`TracingSink`], tests use [`RecordingSink`] and assert on the reports.

use std::sync::Mutex;

use chrono::NaiveTime;
use tracing::{debug, error, info, warn, Level};

use crate::host::PermissionState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Every manifest asset was fetched and stored.
    AssetsCached { cache: String, count: usize },
    /// Install aborted; the previous generation stays active.
    InstallFailed { cache: String, error: String },
    /// A stale cache generation was removed during activation.
    CacheDeleted { cache: String },
    CacheDeleteFailed { cache: String, error: String },
    /// Cache read failed during fetch; treated as a miss.
    CacheLookupFailed { url: String, error: String },
    /// Network failure on an uncached request. No fallback is served.
    FetchFailed { url: String, error: String },
    /// Periodic sync fired outside every reminder window.
    ReminderOutsideWindow { time: NaiveTime },
    /// A reminder window matched but notifications are not permitted.
    PermissionNotGranted { state: PermissionState },
    ReminderShown { hour: u8, tag: String },
    NotificationFailed { tag: String, error: String },
    ClientFocused { url: String },
    WindowOpened { url: String },
}

impl Diagnostic {
    pub fn level(&self) -> Level {
        match self {
            Diagnostic::InstallFailed { .. }
            | Diagnostic::CacheDeleteFailed { .. }
            | Diagnostic::FetchFailed { .. }
            | Diagnostic::NotificationFailed { .. } => Level::ERROR,
            Diagnostic::CacheLookupFailed { .. } | Diagnostic::PermissionNotGranted { .. } => {
                Level::WARN
            }
            Diagnostic::ReminderOutsideWindow { .. } => Level::DEBUG,
            _ => Level::INFO,
        }
    }

    pub fn is_error(&self) -> bool {
        self.level() == Level::ERROR
    }
}

pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing` with structured fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::AssetsCached { cache, count } => {
                info!(cache = %cache, count, "Installation complete, app shell cached");
            }
            Diagnostic::InstallFailed { cache, error } => {
                error!(cache = %cache, error = %error, "Caching failed during install");
            }
            Diagnostic::CacheDeleted { cache } => {
                info!(cache = %cache, "Deleted old cache");
            }
            Diagnostic::CacheDeleteFailed { cache, error } => {
                error!(cache = %cache, error = %error, "Failed to delete old cache");
            }
            Diagnostic::CacheLookupFailed { url, error } => {
                warn!(url = %url, error = %error, "Cache lookup failed, falling back to network");
            }
            Diagnostic::FetchFailed { url, error } => {
                error!(url = %url, error = %error, "Fetch failed");
            }
            Diagnostic::ReminderOutsideWindow { time } => {
                debug!(time = %time.format("%H:%M"), "Periodic sync fired outside any reminder window");
            }
            Diagnostic::PermissionNotGranted { state } => {
                warn!(permission = %state, "Notification permission not granted, reminder skipped");
            }
            Diagnostic::ReminderShown { hour, tag } => {
                info!(hour, tag = %tag, "Reminder notification shown");
            }
            Diagnostic::NotificationFailed { tag, error } => {
                error!(tag = %tag, error = %error, "Failed to show notification");
            }
            Diagnostic::ClientFocused { url } => {
                info!(url = %url, "Focusing existing client window");
            }
            Diagnostic::WindowOpened { url } => {
                info!(url = %url, "No existing client found, opened new window");
            }
        }
    }
}

/// Keeps every report in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<Diagnostic>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<Diagnostic> {
        self.reports
            .lock()
            .map(|reports| reports.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, predicate: impl Fn(&Diagnostic) -> bool) -> bool {
        self.reports().iter().any(predicate)
    }

    pub fn errors(&self) -> Vec<Diagnostic> {
        self.reports().into_iter().filter(Diagnostic::is_error).collect()
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, diagnostic: Diagnostic) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push(diagnostic);
        }
    }
}
