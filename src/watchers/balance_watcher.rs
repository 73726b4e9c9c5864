//! Per-account balance watcher.
//!
//! One watcher owns exactly one account: it derives the account id from
//! the hex address, loads the starting balance, subscribes to the
//! account's storage key, and turns every notification into a balance
//! delta. Watchers share nothing with each other beyond the ledger
//! client.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::accounts::{AccountId, FormatError, PublicKey};
use crate::connectors::storage::{system_account_key, StorageKey};
use crate::connectors::{ClientError, FeedError, LedgerClient};
use crate::events::{decode_account_record, BalanceEvent, ChangeNotification, CodecError};

/// How a watcher reacts to a notification that fails to decode.
///
/// The default matches the fail-fast contract: one malformed payload
/// kills the monitor (and with it the process). `SkipMalformed` is the
/// documented hardening: log and continue, leaving the last known
/// balance untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultPolicy {
    #[default]
    FailFast,
    SkipMalformed,
}

/// Fatal monitor outcomes. Any of these ends the watcher's task, and the
/// supervisor turns the first one into a process exit.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("{label}: invalid address: {source}")]
    AddressFormat {
        label: String,
        #[source]
        source: FormatError,
    },

    #[error("{label}: initial balance fetch failed: {source}")]
    InitialBalance {
        label: String,
        #[source]
        source: ClientError,
    },

    #[error("{label}: could not open change feed: {source}")]
    Subscribe {
        label: String,
        #[source]
        source: ClientError,
    },

    #[error("{label}: change feed failed: {source}")]
    Feed {
        label: String,
        #[source]
        source: FeedError,
    },

    #[error("{label}: notification decode failed: {source}")]
    Decode {
        label: String,
        #[source]
        source: CodecError,
    },

    #[error("{label}: change feed closed")]
    FeedClosed { label: String },

    #[error("supervisor: {0}")]
    Supervisor(String),
}

/// Watches the balance of a single account.
///
/// Responsibilities:
/// - Fetch the starting balance once (no sensible partial state exists
///   without it)
/// - Consume the change feed strictly in delivery order
/// - Classify each decoded balance against the last known one
/// - Emit a `BalanceEvent` per gain or loss; absorb no-ops silently
pub struct BalanceWatcher {
    label: String,
    account_id: AccountId,
    storage_key: StorageKey,
    client: Arc<dyn LedgerClient>,
    event_tx: mpsc::Sender<BalanceEvent>,
    policy: FaultPolicy,
    last_known: u128,
}

impl BalanceWatcher {
    /// Creates a watcher for one (label, hex address) pair.
    ///
    /// Address parsing happens here so that a bad entry aborts before
    /// any monitor task starts.
    pub fn new(
        label: impl Into<String>,
        address: &str,
        client: Arc<dyn LedgerClient>,
        event_tx: mpsc::Sender<BalanceEvent>,
        policy: FaultPolicy,
    ) -> Result<Self, MonitorError> {
        let label = label.into();
        let pk = PublicKey::from_hex(address).map_err(|source| MonitorError::AddressFormat {
            label: label.clone(),
            source,
        })?;
        let account_id = AccountId::from(&pk);
        let storage_key = system_account_key(&account_id);

        Ok(Self {
            label,
            account_id,
            storage_key,
            client,
            event_tx,
            policy,
            last_known: 0,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Runs the watcher until its feed closes or fails.
    ///
    /// Never returns `Ok` in steady state; every exit path carries the
    /// reason the monitor stopped.
    pub async fn run(mut self) -> Result<(), MonitorError> {
        info!("[{}] BalanceWatcher starting for {}", self.label, self.account_id);

        let record = self
            .client
            .account_balance(&self.account_id)
            .await
            .map_err(|source| MonitorError::InitialBalance {
                label: self.label.clone(),
                source,
            })?;
        self.last_known = record.free();
        info!(
            "[{}] Initial free balance: {} plank",
            self.label, self.last_known
        );

        let mut feed = self
            .client
            .open_change_feed(&self.storage_key)
            .await
            .map_err(|source| MonitorError::Subscribe {
                label: self.label.clone(),
                source,
            })?;

        // Each notification is fully processed before the next is read;
        // delivery order is report order.
        loop {
            match feed.next().await {
                Some(Ok(notification)) => self.process(notification).await?,
                Some(Err(source)) => {
                    return Err(MonitorError::Feed {
                        label: self.label.clone(),
                        source,
                    })
                }
                None => {
                    return Err(MonitorError::FeedClosed {
                        label: self.label.clone(),
                    })
                }
            }
        }
    }

    /// Handles one notification: decode, classify, emit, advance state.
    ///
    /// The last known balance is advanced only after a successful decode.
    async fn process(&mut self, notification: ChangeNotification) -> Result<(), MonitorError> {
        let record = match decode_account_record(&notification.raw) {
            Ok(record) => record,
            Err(source) => match self.policy {
                FaultPolicy::FailFast => {
                    return Err(MonitorError::Decode {
                        label: self.label.clone(),
                        source,
                    })
                }
                FaultPolicy::SkipMalformed => {
                    warn!("[{}] Skipping malformed notification: {}", self.label, source);
                    return Ok(());
                }
            },
        };

        let new_balance = record.free();
        match BalanceEvent::from_transition(&self.label, self.last_known, new_balance) {
            Some(event) => {
                if let Err(e) = self.event_tx.send(event).await {
                    warn!("[{}] Failed to emit balance event: {}", self.label, e);
                }
            }
            None => {
                debug!(
                    "[{}] Notification left balance unchanged at {} plank",
                    self.label, new_balance
                );
            }
        }
        self.last_known = new_balance;
        Ok(())
    }
}

impl std::fmt::Debug for BalanceWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceWatcher")
            .field("label", &self.label)
            .field("account_id", &self.account_id)
            .field("policy", &self.policy)
            .field("last_known", &self.last_known)
            .finish()
    }
}
