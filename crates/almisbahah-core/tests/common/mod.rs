#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use almisbahah_core::host::{
    FixedClock, MemoryClients, MemoryNotifier, Network, NetworkError, Notification,
    NotificationError, NotificationSurface, PermissionState, ScopeState,
};
use almisbahah_core::{
    Agent, AgentConfig, HostServices, MemoryCacheStorage, RecordingSink, Request, Response,
};
use async_trait::async_trait;

pub const ORIGIN: &str = "http://localhost:8080";

/// Network serving canned responses and counting calls.
#[derive(Default)]
pub struct FakeNetwork {
    responses: Mutex<HashMap<String, Response>>,
    unreachable: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl FakeNetwork {
    pub fn serving_defaults() -> Self {
        let network = Self::default();
        for path in AgentConfig::default().assets {
            let url = format!("{}/{}", ORIGIN, path.trim_start_matches('/'));
            network.serve(&url, Response::new(200).with_body(format!("body of {}", path)));
        }
        network
    }

    pub fn serve(&self, url: &str, response: Response) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    pub fn make_unreachable(&self, url: &str) {
        self.unreachable.lock().unwrap().insert(url.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let url = request.url.to_string();
        if self.unreachable.lock().unwrap().contains(&url) {
            return Err(NetworkError::Unreachable(url));
        }
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .unwrap_or_else(|| Response::new(404)))
    }
}

/// Notification surface whose display call always fails.
pub struct RejectingNotifier;

#[async_trait]
impl NotificationSurface for RejectingNotifier {
    async fn permission_state(&self) -> PermissionState {
        PermissionState::Granted
    }

    async fn show(&self, _notification: Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Rejected("quota exceeded".to_string()))
    }

    async fn close(&self, _notification: &Notification) {}
}

pub struct Harness {
    pub agent: Agent,
    pub caches: Arc<MemoryCacheStorage>,
    pub network: Arc<FakeNetwork>,
    pub notifier: Arc<MemoryNotifier>,
    pub clients: Arc<MemoryClients>,
    pub scope: Arc<ScopeState>,
    pub diagnostics: Arc<RecordingSink>,
}

pub struct HarnessBuilder {
    config: AgentConfig,
    clock: FixedClock,
    network: FakeNetwork,
    notifications: Option<Arc<dyn NotificationSurface>>,
    permission: PermissionState,
    caches: Arc<MemoryCacheStorage>,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        let mut config = AgentConfig::default();
        config.origin = ORIGIN.to_string();
        Self {
            config,
            clock: FixedClock::at(12, 0).unwrap(),
            network: FakeNetwork::serving_defaults(),
            notifications: None,
            permission: PermissionState::Granted,
            caches: Arc::new(MemoryCacheStorage::new()),
        }
    }

    pub fn config(mut self, apply: impl FnOnce(&mut AgentConfig)) -> Self {
        apply(&mut self.config);
        self
    }

    pub fn at(mut self, hour: u32, minute: u32) -> Self {
        self.clock = FixedClock::at(hour, minute).unwrap();
        self
    }

    pub fn network(mut self, network: FakeNetwork) -> Self {
        self.network = network;
        self
    }

    pub fn permission(mut self, permission: PermissionState) -> Self {
        self.permission = permission;
        self
    }

    pub fn notifications(mut self, surface: Arc<dyn NotificationSurface>) -> Self {
        self.notifications = Some(surface);
        self
    }

    pub fn caches(mut self, caches: Arc<MemoryCacheStorage>) -> Self {
        self.caches = caches;
        self
    }

    pub fn build(self) -> Harness {
        let network = Arc::new(self.network);
        let notifier = Arc::new(MemoryNotifier::new(self.permission));
        let clients = Arc::new(MemoryClients::new());
        let scope = Arc::new(ScopeState::new());
        let diagnostics = Arc::new(RecordingSink::new());
        let notifications = self
            .notifications
            .unwrap_or_else(|| notifier.clone() as Arc<dyn NotificationSurface>);

        let host = HostServices {
            caches: self.caches.clone(),
            network: network.clone(),
            notifications,
            clients: clients.clone(),
            scope: scope.clone(),
            clock: Arc::new(self.clock),
            diagnostics: diagnostics.clone(),
        };
        let agent = Agent::new(self.config, host).expect("valid test config");

        Harness {
            agent,
            caches: self.caches,
            network,
            notifier,
            clients,
            scope,
            diagnostics,
        }
    }
}

pub fn url(path: &str) -> reqwest::Url {
    reqwest::Url::parse(ORIGIN).unwrap().join(path).unwrap()
}
