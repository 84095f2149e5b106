//! Application windows visible to the agent.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientsError {
    #[error("Client not found: {0}")]
    NotFound(String),

    #[error("Host refused to open a window for {0}")]
    OpenRefused(String),

    #[error("Clients state unavailable")]
    Unavailable,
}

/// An open application window or tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowClient {
    pub id: String,
    pub url: String,
    pub focused: bool,
    /// Whether this agent controls the window.
    pub controlled: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientQuery {
    /// Also list windows this agent does not control yet.
    pub include_uncontrolled: bool,
}

#[async_trait]
pub trait Clients: Send + Sync {
    async fn match_all(&self, query: ClientQuery) -> Result<Vec<WindowClient>, ClientsError>;

    async fn focus(&self, id: &str) -> Result<WindowClient, ClientsError>;

    /// Open a new window. `None` when the window opened outside the agent's scope.
    async fn open_window(&self, url: &str) -> Result<Option<WindowClient>, ClientsError>;

    /// Take control of every open window without a reload.
    async fn claim(&self) -> Result<(), ClientsError>;
}

#[derive(Debug, Default)]
struct ClientsState {
    windows: Vec<WindowClient>,
    opened: Vec<String>,
    next_id: u64,
}

/// Window list kept in memory.
#[derive(Debug, Default)]
pub struct MemoryClients {
    state: Mutex<ClientsState>,
}

impl MemoryClients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already open window.
    pub fn add_window(&self, url: impl Into<String>, controlled: bool) -> Option<WindowClient> {
        let mut state = self.state.lock().ok()?;
        state.next_id += 1;
        let client = WindowClient {
            id: format!("window-{}", state.next_id),
            url: url.into(),
            focused: false,
            controlled,
        };
        state.windows.push(client.clone());
        Some(client)
    }

    pub fn windows(&self) -> Vec<WindowClient> {
        self.state
            .lock()
            .map(|state| state.windows.clone())
            .unwrap_or_default()
    }

    /// URLs passed to `open_window`, in order.
    pub fn opened(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.opened.clone())
            .unwrap_or_default()
    }

    pub fn focused(&self) -> Option<WindowClient> {
        self.windows().into_iter().find(|w| w.focused)
    }
}

#[async_trait]
impl Clients for MemoryClients {
    async fn match_all(&self, query: ClientQuery) -> Result<Vec<WindowClient>, ClientsError> {
        let state = self.state.lock().map_err(|_| ClientsError::Unavailable)?;
        Ok(state
            .windows
            .iter()
            .filter(|w| query.include_uncontrolled || w.controlled)
            .cloned()
            .collect())
    }

    async fn focus(&self, id: &str) -> Result<WindowClient, ClientsError> {
        let mut state = self.state.lock().map_err(|_| ClientsError::Unavailable)?;
        if !state.windows.iter().any(|w| w.id == id) {
            return Err(ClientsError::NotFound(id.to_string()));
        }
        for window in state.windows.iter_mut() {
            window.focused = window.id == id;
        }
        state
            .windows
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .ok_or_else(|| ClientsError::NotFound(id.to_string()))
    }

    async fn open_window(&self, url: &str) -> Result<Option<WindowClient>, ClientsError> {
        let mut state = self.state.lock().map_err(|_| ClientsError::Unavailable)?;
        state.next_id += 1;
        let id = format!("window-{}", state.next_id);
        for window in state.windows.iter_mut() {
            window.focused = false;
        }
        let client = WindowClient {
            id,
            url: url.to_string(),
            focused: true,
            controlled: true,
        };
        state.windows.push(client.clone());
        state.opened.push(url.to_string());
        Ok(Some(client))
    }

    async fn claim(&self) -> Result<(), ClientsError> {
        let mut state = self.state.lock().map_err(|_| ClientsError::Unavailable)?;
        for window in state.windows.iter_mut() {
            window.controlled = true;
        }
        Ok(())
    }
}
