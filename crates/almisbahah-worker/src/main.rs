//! Almisbahah worker - headless host for the offline cache and reminder agent.
//!
//! Each invocation delivers one lifecycle signal to the agent, backed by a
//! disk cache, the real network and a console notification surface. Useful
//! for pre-warming the cache of a deployment and for checking the reminder
//! schedule from cron.

mod console;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use almisbahah_core::host::{
    Clock, FixedClock, HttpNetwork, MemoryClients, Notification, PermissionState, ScopeState,
    SystemClock,
};
use almisbahah_core::{
    ActivateEvent, Agent, AgentConfig, CacheStorage, ClickOutcome, DiskCacheStorage, FetchEvent,
    FetchOutcome, HostServices, InstallEvent, Method, NotificationClickEvent, PeriodicSyncEvent,
    Request, SyncOutcome, TracingSink, WorkerEvents,
};
use anyhow::{bail, Context, Result};
use chrono::NaiveTime;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use console::ConsoleNotifier;

// ============================================================================
// Constants
// ============================================================================

const CONFIG_ENV: &str = "ALMISBAHAH_CONFIG";
const ORIGIN_ENV: &str = "ALMISBAHAH_ORIGIN";
const CACHE_DIR_ENV: &str = "ALMISBAHAH_CACHE_DIR";
const PERMISSION_ENV: &str = "ALMISBAHAH_NOTIFICATIONS";
const LOG_DIR_ENV: &str = "ALMISBAHAH_LOG_DIR";

const LOG_FILE_PREFIX: &str = "almisbahah-worker.log";

const USAGE: &str = "\
Usage: almisbahah-worker <command> [args]

Commands:
  install                    Cache every manifest asset into the current generation
  activate                   Delete stale cache generations
  fetch <url|path> [method]  Run a request through the fetch handler
  sync [tag] [--at HH:MM]    Check the reminder schedule (default tag: dhikr-reminder)
  click [url]                Route a notification click
  status                     List stored cache generations
  init-config                Write the default configuration file

Environment:
  ALMISBAHAH_CONFIG          Config file (default ~/.config/almisbahah/config.json)
  ALMISBAHAH_ORIGIN          Override the configured origin
  ALMISBAHAH_CACHE_DIR       Override the cache directory
  ALMISBAHAH_NOTIFICATIONS   granted | denied | prompt (default granted)
  ALMISBAHAH_LOG_DIR         Also write daily rolling log files here
  RUST_LOG                   Log filter (default warn)";

/// Initialize the tracing subscriber for logging
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn load_config() -> Result<AgentConfig> {
    let mut config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => AgentConfig::load_from(&PathBuf::from(path))?,
        None => AgentConfig::load()?,
    };
    if let Ok(origin) = std::env::var(ORIGIN_ENV) {
        config.origin = origin;
    }
    Ok(config)
}

fn cache_dir() -> Result<PathBuf> {
    match std::env::var_os(CACHE_DIR_ENV) {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => AgentConfig::cache_dir(),
    }
}

fn permission() -> Result<PermissionState> {
    match std::env::var(PERMISSION_ENV) {
        Ok(value) => value
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .with_context(|| format!("Invalid {}", PERMISSION_ENV)),
        Err(_) => Ok(PermissionState::Granted),
    }
}

/// Split `--at HH:MM` out of the argument list.
fn take_fixed_time(args: &mut Vec<String>) -> Result<Option<NaiveTime>> {
    let Some(pos) = args.iter().position(|a| a == "--at") else {
        return Ok(None);
    };
    if pos + 1 >= args.len() {
        bail!("--at needs a time in HH:MM format");
    }
    let value = args.remove(pos + 1);
    args.remove(pos);
    let time = NaiveTime::parse_from_str(&value, "%H:%M")
        .with_context(|| format!("Invalid time: {}", value))?;
    Ok(Some(time))
}

struct Worker {
    agent: Agent,
    caches: Arc<DiskCacheStorage>,
}

impl Worker {
    fn new(config: AgentConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let caches = Arc::new(DiskCacheStorage::new(cache_dir()?)?);
        let host = HostServices {
            caches: caches.clone(),
            network: Arc::new(HttpNetwork::new()?),
            notifications: Arc::new(ConsoleNotifier::new(permission()?)),
            clients: Arc::new(MemoryClients::new()),
            scope: Arc::new(ScopeState::new()),
            clock,
            diagnostics: Arc::new(TracingSink),
        };
        let agent = Agent::new(config, host)?;
        Ok(Self { agent, caches })
    }

    async fn install(&self) -> Result<()> {
        let outcome = self.agent.on_install(InstallEvent).await?;
        println!("Cached {} assets into {}", outcome.cached, outcome.cache);
        Ok(())
    }

    async fn activate(&self) -> Result<()> {
        let outcome = self.agent.on_activate(ActivateEvent).await?;
        if outcome.deleted.is_empty() {
            println!("No stale caches");
        }
        for name in outcome.deleted {
            println!("Deleted {}", name);
        }
        Ok(())
    }

    async fn fetch(&self, target: &str, method: Option<&str>) -> Result<()> {
        let method = match method {
            Some(m) => Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("Invalid method: {}", m))?,
            None => Method::GET,
        };
        let url = self.agent.resolve(target)?;
        let outcome = self
            .agent
            .on_fetch(FetchEvent::new(Request::new(method, url.clone())))
            .await;

        match &outcome {
            FetchOutcome::Cache(response) | FetchOutcome::Network(response) => println!(
                "{} {} ({}, {} bytes)",
                response.status,
                url,
                outcome.source(),
                response.body.len()
            ),
            FetchOutcome::Passthrough => println!("{} not intercepted", url),
            FetchOutcome::Failed => bail!("Fetch failed for {}", url),
        }
        Ok(())
    }

    async fn sync(&self, tag: &str) -> Result<()> {
        match self.agent.on_periodic_sync(PeriodicSyncEvent::new(tag)).await {
            SyncOutcome::Ignored => println!("Tag {} is not handled", tag),
            SyncOutcome::OutsideWindow => println!("Outside every reminder window"),
            SyncOutcome::Suppressed(state) => {
                println!("Reminder due but notification permission is {}", state)
            }
            SyncOutcome::Shown { tag } => info!(tag = %tag, "Reminder delivered"),
            SyncOutcome::DisplayFailed => bail!("Reminder could not be displayed"),
        }
        Ok(())
    }

    async fn click(&self, url: Option<String>) -> Result<()> {
        let mut notification = Notification::new("reminder");
        notification.data.url = url;
        let outcome = self
            .agent
            .on_notification_click(NotificationClickEvent::new(notification))
            .await?;
        match outcome {
            ClickOutcome::Focused(window) => println!("Focused {}", window.url),
            ClickOutcome::Opened { url } => println!("Open {}", url),
        }
        Ok(())
    }

    async fn status(&self) -> Result<()> {
        let current = &self.agent.config().cache_name;
        let names = self.caches.keys().await?;
        if names.is_empty() {
            println!("No cache generations in {}", self.caches.cache_dir().display());
        }
        for name in names {
            let entries = self.caches.entry_count(&name).await?;
            let age = self
                .caches
                .age_display(&name)
                .await?
                .unwrap_or_else(|| "never".to_string());
            let marker = if &name == current { "*" } else { " " };
            println!("{} {} ({} entries, updated {})", marker, name, entries, age);
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let fixed_time = take_fixed_time(&mut args)?;
    let Some(command) = args.first().cloned() else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    if command == "init-config" {
        let path = AgentConfig::default().save()?;
        println!("Wrote {}", path.display());
        return Ok(());
    }
    if command == "help" || command == "--help" || command == "-h" {
        println!("{}", USAGE);
        return Ok(());
    }

    let clock: Arc<dyn Clock> = match fixed_time {
        Some(time) => Arc::new(FixedClock(time)),
        None => Arc::new(SystemClock),
    };
    let worker = Worker::new(load_config()?, clock)?;
    info!(command = %command, "Almisbahah worker starting");

    match command.as_str() {
        "install" => worker.install().await,
        "activate" => worker.activate().await,
        "fetch" => {
            let target = args.get(1).context("fetch needs a URL or path")?;
            worker.fetch(target, args.get(2).map(String::as_str)).await
        }
        "sync" => {
            let default_tag = worker.agent.config().reminder_tag.clone();
            let tag = args.get(1).cloned().unwrap_or(default_tag);
            worker.sync(&tag).await
        }
        "click" => worker.click(args.get(1).cloned()).await,
        "status" => worker.status().await,
        other => bail!("Unknown command: {}\n\n{}", other, USAGE),
    }
}
