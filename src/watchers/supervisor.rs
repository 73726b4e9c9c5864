//! Monitor supervisor: fan-out at startup, then stay resident.
//!
//! The supervisor spawns one balance watcher per watch-list entry and
//! afterwards only drains balance events to the output sink. It does
//! not restart anything: the first watcher to stop, for any reason,
//! takes the whole process down. That trade-off is deliberate.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::accounts::{UnitScale, WatchedAccount};
use crate::connectors::LedgerClient;
use crate::events::BalanceEvent;
use crate::watchers::{BalanceWatcher, FaultPolicy, MonitorError};

/// Capacity of the shared report channel.
const EVENT_BUFFER: usize = 1024;

/// Launches the configured balance watchers and keeps the process alive
/// while they run.
pub struct MonitorSupervisor {
    client: Arc<dyn LedgerClient>,
    scale: UnitScale,
    accounts: Vec<WatchedAccount>,
    policy: FaultPolicy,
}

impl MonitorSupervisor {
    pub fn new(
        client: Arc<dyn LedgerClient>,
        scale: UnitScale,
        accounts: Vec<WatchedAccount>,
    ) -> Self {
        Self {
            client,
            scale,
            accounts,
            policy: FaultPolicy::default(),
        }
    }

    /// Overrides the decode fault policy handed to every watcher.
    pub fn with_policy(mut self, policy: FaultPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Runs until the first watcher stops.
    ///
    /// Never returns `Ok` under normal operation; the returned error is
    /// whatever ended the first monitor (or a supervisor-level failure),
    /// and the caller is expected to exit with it.
    pub async fn run(self) -> Result<(), MonitorError> {
        info!("Starting {} balance watcher(s)", self.accounts.len());

        // Construct every watcher before spawning any, so a bad address
        // aborts with no monitor task started.
        let (event_tx, mut event_rx) = mpsc::channel(EVENT_BUFFER);
        let mut watchers = Vec::with_capacity(self.accounts.len());
        for account in &self.accounts {
            let watcher = BalanceWatcher::new(
                &account.label,
                &account.address,
                Arc::clone(&self.client),
                event_tx.clone(),
                self.policy,
            )?;
            watchers.push(watcher);
        }
        drop(event_tx);

        let mut tasks: JoinSet<Result<(), MonitorError>> = JoinSet::new();
        for watcher in watchers {
            info!("[{}] Spawning watcher", watcher.label());
            tasks.spawn(watcher.run());
        }

        // Steady state: one report line per event. Reports from different
        // watchers interleave, but each line is written atomically.
        loop {
            tokio::select! {
                Some(event) = event_rx.recv() => {
                    info!("{}", event.render(&self.scale));
                }
                Some(finished) = tasks.join_next() => {
                    let err = match finished {
                        Ok(Err(e)) => e,
                        Ok(Ok(())) => {
                            MonitorError::Supervisor("watcher exited unexpectedly".to_string())
                        }
                        Err(join_err) => MonitorError::Supervisor(format!(
                            "watcher task panicked: {}",
                            join_err
                        )),
                    };
                    error!("Watcher stopped, shutting down: {}", err);

                    // Flush reports that were already queued.
                    while let Ok(event) = event_rx.try_recv() {
                        info!("{}", event.render(&self.scale));
                    }
                    return Err(err);
                }
                else => {
                    return Err(MonitorError::Supervisor(
                        "all watcher tasks vanished".to_string(),
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::AccountId;
    use crate::connectors::storage::StorageKey;
    use crate::connectors::{ChangeFeed, ClientError};
    use crate::events::{AccountData, AccountInfo};

    const ALICE: &str = "0xd43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";
    const BOB: &str = "0x8eaf04151687736326c9fea17e25fc5287613693c912909cb226aa4794f26a48";

    /// Ledger whose feeds close immediately after subscription.
    struct ClosingLedger;

    #[async_trait::async_trait]
    impl LedgerClient for ClosingLedger {
        async fn account_balance(&self, _id: &AccountId) -> Result<AccountInfo, ClientError> {
            Ok(AccountInfo {
                nonce: 0,
                consumers: 0,
                providers: 1,
                data: AccountData {
                    free: 1000,
                    reserved: 0,
                    misc_frozen: 0,
                    fee_frozen: 0,
                },
            })
        }

        async fn open_change_feed(&self, _key: &StorageKey) -> Result<ChangeFeed, ClientError> {
            let (tx, feed) = ChangeFeed::channel();
            drop(tx);
            Ok(feed)
        }
    }

    #[tokio::test]
    async fn test_first_watcher_exit_brings_supervisor_down() {
        let supervisor = MonitorSupervisor::new(
            Arc::new(ClosingLedger),
            UnitScale::new(100),
            vec![
                WatchedAccount::new("alice", ALICE),
                WatchedAccount::new("bob", BOB),
            ],
        );

        let result = supervisor.run().await;
        assert!(matches!(result, Err(MonitorError::FeedClosed { .. })));
    }

    #[tokio::test]
    async fn test_bad_address_aborts_before_spawning() {
        let supervisor = MonitorSupervisor::new(
            Arc::new(ClosingLedger),
            UnitScale::new(100),
            vec![
                WatchedAccount::new("alice", ALICE),
                WatchedAccount::new("mallory", "0xnothex"),
            ],
        );

        let result = supervisor.run().await;
        match result {
            Err(MonitorError::AddressFormat { label, .. }) => assert_eq!(label, "mallory"),
            other => panic!("expected address error, got {:?}", other),
        }
    }
}
