//! The offline cache and reminder agent.
//!
//! [`Agent`] owns an immutable [`AgentConfig`] and the host capabilities in
//! [`HostServices`]. Its handlers live in three files:
//!
//! - `lifecycle`: install, activate and fetch (the cache lifecycle)
//! - `reminder`: periodic sync against the reminder schedule
//! - `click`: notification click routing

mod click;
pub mod events;
mod lifecycle;
mod reminder;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

pub use events::{
    ActivateEvent, ActivateOutcome, ClickOutcome, EventOutcome, EventType, FetchEvent,
    FetchOutcome, InstallEvent, InstallOutcome, NotificationClickEvent, PeriodicSyncEvent,
    SyncOutcome, WorkerEvent,
};

use crate::cache::CacheStorage;
use crate::config::AgentConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::AgentError;
use crate::host::{Clients, Clock, Network, NotificationSurface, WorkerScope};
use crate::schedule::ReminderSchedule;

/// Capabilities the host lends to the agent.
#[derive(Clone)]
pub struct HostServices {
    pub caches: Arc<dyn CacheStorage>,
    pub network: Arc<dyn Network>,
    pub notifications: Arc<dyn NotificationSurface>,
    pub clients: Arc<dyn Clients>,
    pub scope: Arc<dyn WorkerScope>,
    pub clock: Arc<dyn Clock>,
    pub diagnostics: Arc<dyn DiagnosticSink>,
}

/// One method per lifecycle signal. The host awaits each returned future
/// before it may suspend the agent.
#[async_trait]
pub trait WorkerEvents: Send + Sync {
    async fn on_install(&self, event: InstallEvent) -> Result<InstallOutcome, AgentError>;

    async fn on_activate(&self, event: ActivateEvent) -> Result<ActivateOutcome, AgentError>;

    async fn on_fetch(&self, event: FetchEvent) -> FetchOutcome;

    async fn on_periodic_sync(&self, event: PeriodicSyncEvent) -> SyncOutcome;

    async fn on_notification_click(
        &self,
        event: NotificationClickEvent,
    ) -> Result<ClickOutcome, AgentError>;

    /// Route any signal to its handler.
    async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome, AgentError> {
        debug!(event = %event.event_type(), "Dispatching worker event");
        let outcome = match event {
            WorkerEvent::Install(e) => EventOutcome::Install(self.on_install(e).await?),
            WorkerEvent::Activate(e) => EventOutcome::Activate(self.on_activate(e).await?),
            WorkerEvent::Fetch(e) => EventOutcome::Fetch(self.on_fetch(e).await),
            WorkerEvent::PeriodicSync(e) => {
                EventOutcome::PeriodicSync(self.on_periodic_sync(e).await)
            }
            WorkerEvent::NotificationClick(e) => {
                EventOutcome::NotificationClick(self.on_notification_click(e).await?)
            }
        };
        Ok(outcome)
    }
}

pub struct Agent {
    config: AgentConfig,
    origin: Url,
    schedule: ReminderSchedule,
    host: HostServices,
}

impl Agent {
    pub fn new(config: AgentConfig, host: HostServices) -> Result<Self, AgentError> {
        config.validate()?;
        let origin = config.origin_url()?;
        let schedule = config.schedule();
        Ok(Self {
            config,
            origin,
            schedule,
            host,
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Resolve a manifest path or start path against the origin.
    pub fn resolve(&self, path: &str) -> Result<Url, AgentError> {
        self.origin.join(path).map_err(|_| AgentError::InvalidAsset {
            path: path.to_string(),
        })
    }

    /// Serialized origin without a trailing slash, e.g. `http://localhost:8080`.
    fn origin_string(&self) -> String {
        self.origin.origin().ascii_serialization()
    }

    fn report(&self, diagnostic: Diagnostic) {
        self.host.diagnostics.report(diagnostic);
    }
}

#[async_trait]
impl WorkerEvents for Agent {
    async fn on_install(&self, _event: InstallEvent) -> Result<InstallOutcome, AgentError> {
        self.install().await
    }

    async fn on_activate(&self, _event: ActivateEvent) -> Result<ActivateOutcome, AgentError> {
        self.activate().await
    }

    async fn on_fetch(&self, event: FetchEvent) -> FetchOutcome {
        self.fetch(event.request).await
    }

    async fn on_periodic_sync(&self, event: PeriodicSyncEvent) -> SyncOutcome {
        self.check_reminders(&event.tag).await
    }

    async fn on_notification_click(
        &self,
        event: NotificationClickEvent,
    ) -> Result<ClickOutcome, AgentError> {
        self.route_click(event).await
    }
}
