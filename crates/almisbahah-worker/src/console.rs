//! Terminal stand-ins for the browser's notification surface.

use std::sync::Mutex;

use almisbahah_core::host::{
    Notification, NotificationError, NotificationSurface, PermissionState,
};
use async_trait::async_trait;

/// Prints notifications to stdout instead of the OS notification tray.
pub struct ConsoleNotifier {
    permission: PermissionState,
    shown: Mutex<Vec<String>>,
}

impl ConsoleNotifier {
    pub fn new(permission: PermissionState) -> Self {
        Self {
            permission,
            shown: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl NotificationSurface for ConsoleNotifier {
    async fn permission_state(&self) -> PermissionState {
        self.permission
    }

    async fn show(&self, notification: Notification) -> Result<(), NotificationError> {
        let mut shown = self
            .shown
            .lock()
            .map_err(|_| NotificationError::Rejected("console unavailable".to_string()))?;

        println!("🔔 {}", notification.title);
        if let Some(body) = &notification.body {
            println!("   {}", body);
        }
        if let Some(url) = &notification.data.url {
            println!("   → {}", url);
        }
        // Untagged notifications never replace one another.
        if let Some(tag) = notification.tag {
            if shown.contains(&tag) {
                println!("   (replaces earlier notification tagged {})", tag);
            } else {
                shown.push(tag);
            }
        }
        Ok(())
    }

    async fn close(&self, notification: &Notification) {
        if let (Some(tag), Ok(mut shown)) = (notification.tag.as_ref(), self.shown.lock()) {
            shown.retain(|t| t != tag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reports_configured_permission() {
        let notifier = ConsoleNotifier::new(PermissionState::Denied);
        assert_eq!(notifier.permission_state().await, PermissionState::Denied);
    }

    #[tokio::test]
    async fn test_show_and_close_track_tags() {
        let notifier = ConsoleNotifier::new(PermissionState::Granted);
        let reminder = Notification::new("تذكير").with_tag("dhikr-reminder-8");
        notifier.show(reminder.clone()).await.unwrap();
        notifier.show(reminder.clone()).await.unwrap();
        assert_eq!(notifier.shown.lock().unwrap().len(), 1);

        notifier.close(&reminder).await;
        assert!(notifier.shown.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_untagged_notifications_are_not_tracked() {
        let notifier = ConsoleNotifier::new(PermissionState::Granted);
        notifier.show(Notification::new("one")).await.unwrap();
        notifier.show(Notification::new("two")).await.unwrap();
        assert!(notifier.shown.lock().unwrap().is_empty());
    }
}
