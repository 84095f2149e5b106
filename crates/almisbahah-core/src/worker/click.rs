use tracing::debug;

use super::events::{ClickOutcome, NotificationClickEvent};
use super::Agent;
use crate::diagnostics::Diagnostic;
use crate::error::AgentError;
use crate::host::ClientQuery;

impl Agent {
    /// Focus a window already showing the target, or open one.
    pub(super) async fn route_click(
        &self,
        event: NotificationClickEvent,
    ) -> Result<ClickOutcome, AgentError> {
        self.host.notifications.close(&event.notification).await;

        let target = event
            .notification
            .data
            .url
            .clone()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| self.origin_string());
        debug!(target = %target, action = ?event.action, "Notification clicked");

        let windows = self
            .host
            .clients
            .match_all(ClientQuery {
                include_uncontrolled: true,
            })
            .await?;

        if let Some(window) = windows.into_iter().find(|w| w.url.starts_with(&target)) {
            let focused = self.host.clients.focus(&window.id).await?;
            self.report(Diagnostic::ClientFocused {
                url: focused.url.clone(),
            });
            return Ok(ClickOutcome::Focused(focused));
        }

        self.host.clients.open_window(&target).await?;
        self.report(Diagnostic::WindowOpened {
            url: target.clone(),
        });
        Ok(ClickOutcome::Opened { url: target })
    }
}
