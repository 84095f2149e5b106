use tracing::debug;

use super::events::SyncOutcome;
use super::Agent;
use crate::diagnostics::Diagnostic;
use crate::host::{Notification, PermissionState};
use crate::schedule::ReminderTime;

impl Agent {
    /// Tag for a reminder's notification. One tag per hour, so a repeat for
    /// the same hour replaces the visible one.
    pub fn reminder_tag(&self, reminder: &ReminderTime) -> String {
        format!("{}-{}", self.config.reminder_tag, reminder.hour)
    }

    /// Notification shown for a due reminder.
    pub fn reminder_notification(&self, reminder: &ReminderTime) -> Notification {
        let template = &self.config.notification;
        let url = self
            .resolve(&template.start_path)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| self.origin_string());

        Notification::new(template.title_for(reminder))
            .with_body(template.body.clone())
            .with_icon(template.icon.clone())
            .with_badge(template.badge.clone())
            .with_vibrate(template.vibrate.clone())
            .with_url(url)
            .with_tag(self.reminder_tag(reminder))
            .with_renotify(true)
    }

    pub(super) async fn check_reminders(&self, tag: &str) -> SyncOutcome {
        if tag != self.config.reminder_tag {
            debug!(tag, "Ignoring periodic sync for unknown tag");
            return SyncOutcome::Ignored;
        }

        let now = self.host.clock.now();
        let reminder = match self.schedule.due_at(now) {
            Some(reminder) => reminder,
            None => {
                self.report(Diagnostic::ReminderOutsideWindow { time: now });
                return SyncOutcome::OutsideWindow;
            }
        };
        debug!(
            hour = reminder.hour,
            minute = reminder.minute,
            "Time matches reminder window"
        );

        let permission = self.host.notifications.permission_state().await;
        if permission != PermissionState::Granted {
            self.report(Diagnostic::PermissionNotGranted { state: permission });
            return SyncOutcome::Suppressed(permission);
        }

        let tag = self.reminder_tag(reminder);
        match self
            .host
            .notifications
            .show(self.reminder_notification(reminder))
            .await
        {
            Ok(()) => {
                self.report(Diagnostic::ReminderShown {
                    hour: reminder.hour,
                    tag: tag.clone(),
                });
                SyncOutcome::Shown { tag }
            }
            Err(e) => {
                self.report(Diagnostic::NotificationFailed {
                    tag,
                    error: e.to_string(),
                });
                SyncOutcome::DisplayFailed
            }
        }
    }
}
