//! Signals delivered to the agent and what each handler produced.

use std::fmt;

use crate::host::{Notification, PermissionState, WindowClient};
use crate::http::{Request, Response};

/// Event type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Install,
    Activate,
    Fetch,
    PeriodicSync,
    NotificationClick,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventType::Install => "install",
            EventType::Activate => "activate",
            EventType::Fetch => "fetch",
            EventType::PeriodicSync => "periodicsync",
            EventType::NotificationClick => "notificationclick",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallEvent;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivateEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchEvent {
    pub request: Request,
}

impl FetchEvent {
    pub fn new(request: Request) -> Self {
        Self { request }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodicSyncEvent {
    pub tag: String,
}

impl PeriodicSyncEvent {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationClickEvent {
    pub notification: Notification,
    /// Action button pressed, `None` for a click on the body.
    pub action: Option<String>,
}

impl NotificationClickEvent {
    pub fn new(notification: Notification) -> Self {
        Self {
            notification,
            action: None,
        }
    }
}

/// Any signal, for hosts that dispatch through a single entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    Install(InstallEvent),
    Activate(ActivateEvent),
    Fetch(FetchEvent),
    PeriodicSync(PeriodicSyncEvent),
    NotificationClick(NotificationClickEvent),
}

impl WorkerEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            WorkerEvent::Install(_) => EventType::Install,
            WorkerEvent::Activate(_) => EventType::Activate,
            WorkerEvent::Fetch(_) => EventType::Fetch,
            WorkerEvent::PeriodicSync(_) => EventType::PeriodicSync,
            WorkerEvent::NotificationClick(_) => EventType::NotificationClick,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub cache: String,
    pub cached: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivateOutcome {
    /// Stale generations removed, in listing order.
    pub deleted: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the host applies its default handling.
    Passthrough,
    /// Served from the active cache generation.
    Cache(Response),
    /// Cache miss; the network response, unmodified.
    Network(Response),
    /// Cache miss and the network failed. No fallback is served.
    Failed,
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::Cache(response) | FetchOutcome::Network(response) => Some(response),
            FetchOutcome::Passthrough | FetchOutcome::Failed => None,
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            FetchOutcome::Passthrough => "passthrough",
            FetchOutcome::Cache(_) => "cache",
            FetchOutcome::Network(_) => "network",
            FetchOutcome::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The tag is not the reminder task.
    Ignored,
    /// No reminder window contains the current time.
    OutsideWindow,
    /// A window matched but notifications are not permitted.
    Suppressed(PermissionState),
    Shown { tag: String },
    /// The host rejected the notification.
    DisplayFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Focused(WindowClient),
    Opened { url: String },
}

/// Result of [`crate::Agent::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Install(InstallOutcome),
    Activate(ActivateOutcome),
    Fetch(FetchOutcome),
    PeriodicSync(SyncOutcome),
    NotificationClick(ClickOutcome),
}
