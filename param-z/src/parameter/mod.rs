//! The parameter subsystem.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  ParameterServer ("robot1")                                    │
//! │  ├── store: Arc<Mutex<ParameterStore>>                         │
//! │  ├── subs: set/get/list requests, filtered on node_id          │
//! │  ├── pubs: set/get/list responses                              │
//! │  └── event publisher: parameter_events                         │
//! └────────────────────────────────────────────────────────────────┘
//! ┌────────────────────────────────────────────────────────────────┐
//! │  ParameterClient                                               │
//! │  ├── pubs: set/get/list requests (addressed by node_id)        │
//! │  ├── subs: responses, matched on (node_id, request_id)         │
//! │  └── optional event callback: parameter_events (unfiltered)    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Requests and responses travel on shared broadcast topics; addressing is
//! purely content-based. A server never observes requests for other nodes,
//! and a client's only signal for an absent node is its own timeout.

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod client;
pub mod server;
pub mod store;
pub mod types;
pub mod wire;
pub mod yaml;

/// Poison-tolerant lock: a poisoned mutex only means some handler panicked
/// mid-call; the guarded state is still usable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub use client::ParameterClient;
pub use server::ParameterServer;
pub use store::{ParameterStore, PendingChanges};
pub use types::{Parameter, ParameterEvent, ParameterKind, ParameterValue, SetResult};
