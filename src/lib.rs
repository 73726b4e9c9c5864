//! Real-time balance-change monitor for Substrate-style ledgers.
//!
//! Watches the free balance of a static list of accounts and reports
//! every change as a delta plus the resulting balance, in DOT.
//!
//! # Architecture
//!
//! - **Account isolation**: one independent watcher task per watched
//!   account; a watcher owns its own last-known-balance state and never
//!   touches another watcher's
//! - **Event-driven**: raw storage-change payloads are decoded and
//!   normalized into typed `BalanceEvent`s before anything reports them
//! - **Fail fast**: no error is caught and suppressed; the first fatal
//!   error in any watcher takes the whole process down
//! - **Strict per-account ordering**: each notification is fully
//!   processed before the next one is read
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use dot_balance_monitor::accounts::{watchlist, UnitScale};
//! use dot_balance_monitor::connectors::NodeClient;
//! use dot_balance_monitor::watchers::MonitorSupervisor;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Arc::new(NodeClient::from_env());
//!     let supervisor = MonitorSupervisor::new(client, UnitScale::from_env(), watchlist());
//!
//!     // Runs until the first watcher stops.
//!     let err = supervisor.run().await.unwrap_err();
//!     eprintln!("monitoring stopped: {}", err);
//! }
//! ```

pub mod accounts;
pub mod connectors;
pub mod events;
pub mod utils;
pub mod watchers;

// Re-export commonly used types
pub use accounts::{AccountId, PublicKey, UnitScale, WatchedAccount};
pub use connectors::{ChangeFeed, LedgerClient, NodeClient};
pub use events::BalanceEvent;
pub use watchers::{BalanceWatcher, FaultPolicy, MonitorSupervisor};
