//! Ledger node connectivity.
//!
//! This module provides the low-level client for a Substrate node:
//! storage queries, storage-key construction, and the change-notification
//! subscription. All data fetched here is raw and must be decoded through
//! the events layer before use.

mod node;
pub mod storage;

pub use node::{ChangeFeed, ClientError, FeedError, LedgerClient, NodeClient};
