//! Capabilities the agent borrows from its host.
//!
//! - `Network`: issue requests (`HttpNetwork` over reqwest)
//! - `NotificationSurface`: permission query and display (`MemoryNotifier`)
//! - `Clients`: window enumeration, focus and open (`MemoryClients`)
//! - `WorkerScope`: lifecycle requests to the host (`ScopeState`)
//! - `Clock`: local wall-clock time (`SystemClock`, `FixedClock`)

pub mod clients;
pub mod clock;
pub mod network;
pub mod notifications;
pub mod scope;

pub use clients::{ClientQuery, Clients, ClientsError, MemoryClients, WindowClient};
pub use clock::{Clock, FixedClock, SystemClock};
pub use network::{HttpNetwork, Network, NetworkError};
pub use notifications::{
    MemoryNotifier, Notification, NotificationData, NotificationError, NotificationSurface,
    PermissionState,
};
pub use scope::{ScopeState, WorkerScope};
