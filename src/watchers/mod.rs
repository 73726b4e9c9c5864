//! Watcher subsystems for balance monitoring.
//!
//! One `BalanceWatcher` per watched account, all spawned and kept
//! resident by the `MonitorSupervisor`. Watchers operate independently;
//! nothing is shared between them except the ledger client.

mod balance_watcher;
mod supervisor;

pub use balance_watcher::{BalanceWatcher, FaultPolicy, MonitorError};
pub use supervisor::MonitorSupervisor;
