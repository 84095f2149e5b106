//! Local notification surface.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    #[error("Host rejected the notification: {0}")]
    Rejected(String),
}

/// Notification permission as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    /// Not decided yet; the user has not been asked.
    Prompt,
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PermissionState::Granted => "granted",
            PermissionState::Denied => "denied",
            PermissionState::Prompt => "prompt",
        };
        f.write_str(s)
    }
}

impl FromStr for PermissionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "granted" => Ok(PermissionState::Granted),
            "denied" => Ok(PermissionState::Denied),
            "prompt" | "default" => Ok(PermissionState::Prompt),
            other => Err(format!("unknown permission state: {}", other)),
        }
    }
}

/// Payload attached to a notification and handed back on click.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub url: Option<String>,
}

/// A notification as requested for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: Option<String>,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    /// De-duplication key: a new notification replaces a visible one with the same tag.
    pub tag: Option<String>,
    /// Alert again when replacing a notification with the same tag.
    pub renotify: bool,
}

impl Notification {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: None,
            icon: None,
            badge: None,
            vibrate: Vec::new(),
            data: NotificationData::default(),
            tag: None,
            renotify: false,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_badge(mut self, badge: impl Into<String>) -> Self {
        self.badge = Some(badge.into());
        self
    }

    pub fn with_vibrate(mut self, pattern: Vec<u32>) -> Self {
        self.vibrate = pattern;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.data.url = Some(url.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_renotify(mut self, renotify: bool) -> Self {
        self.renotify = renotify;
        self
    }
}

#[async_trait]
pub trait NotificationSurface: Send + Sync {
    async fn permission_state(&self) -> PermissionState;

    async fn show(&self, notification: Notification) -> Result<(), NotificationError>;

    /// Dismiss a shown notification.
    async fn close(&self, notification: &Notification);
}

#[derive(Debug)]
struct NotifierState {
    permission: PermissionState,
    visible: Vec<Notification>,
    alerts: usize,
}

/// Notification surface that keeps visible notifications in memory.
#[derive(Debug)]
pub struct MemoryNotifier {
    state: Mutex<NotifierState>,
}

impl MemoryNotifier {
    pub fn new(permission: PermissionState) -> Self {
        Self {
            state: Mutex::new(NotifierState {
                permission,
                visible: Vec::new(),
                alerts: 0,
            }),
        }
    }

    pub fn set_permission(&self, permission: PermissionState) {
        if let Ok(mut state) = self.state.lock() {
            state.permission = permission;
        }
    }

    /// Notifications currently visible, oldest first.
    pub fn visible(&self) -> Vec<Notification> {
        self.state
            .lock()
            .map(|state| state.visible.clone())
            .unwrap_or_default()
    }

    /// How many times the user was alerted (sound/vibration).
    pub fn alerts(&self) -> usize {
        self.state.lock().map(|state| state.alerts).unwrap_or(0)
    }
}

impl Default for MemoryNotifier {
    fn default() -> Self {
        Self::new(PermissionState::Prompt)
    }
}

#[async_trait]
impl NotificationSurface for MemoryNotifier {
    async fn permission_state(&self) -> PermissionState {
        self.state
            .lock()
            .map(|state| state.permission)
            .unwrap_or(PermissionState::Denied)
    }

    async fn show(&self, notification: Notification) -> Result<(), NotificationError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| NotificationError::Rejected("notifier state poisoned".to_string()))?;
        if state.permission != PermissionState::Granted {
            return Err(NotificationError::Rejected(format!(
                "permission is {}",
                state.permission
            )));
        }

        let replaced = match notification.tag.as_deref() {
            Some(tag) => state
                .visible
                .iter()
                .position(|n| n.tag.as_deref() == Some(tag)),
            None => None,
        };
        match replaced {
            Some(index) => {
                if notification.renotify {
                    state.alerts += 1;
                }
                state.visible[index] = notification;
            }
            None => {
                state.alerts += 1;
                state.visible.push(notification);
            }
        }
        Ok(())
    }

    async fn close(&self, notification: &Notification) {
        if let Ok(mut state) = self.state.lock() {
            match notification.tag.as_deref() {
                Some(tag) => state.visible.retain(|n| n.tag.as_deref() != Some(tag)),
                None => state.visible.retain(|n| n != notification),
            }
        }
    }
}
