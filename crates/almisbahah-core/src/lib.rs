//! Offline asset cache and reminder agent for the Almisbahah dhikr counter.
//!
//! The agent runs in a background context owned by a host (a browser, or the
//! headless harness in `almisbahah-worker`). It reacts to five signals:
//!
//! - install: pre-cache the asset manifest into a named cache generation
//! - activate: delete every stale cache generation and claim open clients
//! - fetch: answer GET requests cache-first, falling back to the network
//! - periodic sync: compare the local clock with the reminder schedule and
//!   show a notification when a reminder window is open
//! - notification click: focus a matching window or open a new one
//!
//! Every capability the agent needs from its host is a trait in [`host`] and
//! [`cache`], so hosts and tests can substitute their own implementations.
//! Handlers return futures; the host keeps the context alive until they settle.

pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod host;
pub mod http;
pub mod schedule;
pub mod worker;

pub use cache::{CacheStorage, DiskCacheStorage, MemoryCacheStorage};
pub use config::{AgentConfig, ConfigError, NotificationTemplate};
pub use diagnostics::{Diagnostic, DiagnosticSink, RecordingSink, TracingSink};
pub use error::AgentError;
pub use http::{Method, Request, Response};
pub use schedule::{ReminderSchedule, ReminderTime};
pub use worker::{
    ActivateEvent, ActivateOutcome, Agent, ClickOutcome, EventOutcome, FetchEvent, FetchOutcome,
    HostServices, InstallEvent, InstallOutcome, NotificationClickEvent, PeriodicSyncEvent,
    SyncOutcome, WorkerEvent, WorkerEvents,
};
