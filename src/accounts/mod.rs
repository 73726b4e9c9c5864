//! Watched-account definitions and address handling.
//!
//! Each watched account operates in complete isolation with its own:
//! - Async monitor task
//! - Last-known-balance state
//! - Change-notification feed
//!
//! Addresses enter the system as hex-encoded sr25519 public keys; the
//! on-chain account identifier (AccountId32) is the public key bytes
//! verbatim.

mod units;

pub use units::{UnitScale, DEFAULT_PLANK_PER_DOT};

use std::fmt;

use thiserror::Error;

/// Well-known development addresses watched by default.
///
/// These are the standard dev-chain keys; override by editing the
/// watchlist, not by runtime configuration (the watch list is static
/// by design).
const DEFAULT_WATCHLIST: &[(&str, &str)] = &[
    (
        "alice",
        "0xd43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d",
    ),
    (
        "bob",
        "0x8eaf04151687736326c9fea17e25fc5287613693c912909cb226aa4794f26a48",
    ),
];

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("address is not valid hex: {0}")]
    InvalidHex(String),

    #[error("expected a 32-byte public key, got {0} bytes")]
    BadLength(usize),
}

/// A (label, address) pair from the watch list.
///
/// The label is a free-form reporting tag; nothing enforces uniqueness.
#[derive(Debug, Clone)]
pub struct WatchedAccount {
    pub label: String,
    pub address: String,
}

impl WatchedAccount {
    pub fn new(label: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            address: address.into(),
        }
    }
}

/// Returns the compiled-in list of accounts to watch.
pub fn watchlist() -> Vec<WatchedAccount> {
    DEFAULT_WATCHLIST
        .iter()
        .map(|(label, addr)| WatchedAccount::new(*label, *addr))
        .collect()
}

/// A 32-byte sr25519 public key parsed from a hex address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    /// Parses a public key from a hex string, with or without a `0x` prefix.
    pub fn from_hex(addr: &str) -> Result<Self, FormatError> {
        let stripped = addr.strip_prefix("0x").unwrap_or(addr);
        let bytes =
            hex::decode(stripped).map_err(|e| FormatError::InvalidHex(e.to_string()))?;
        let raw: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| FormatError::BadLength(bytes.len()))?;
        Ok(Self(raw))
    }
}

/// On-chain account identifier used as the storage lookup key.
///
/// Derivation from the public key is pure and deterministic: AccountId32
/// is the key bytes themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<&PublicKey> for AccountId {
    fn from(pk: &PublicKey) -> Self {
        Self(pk.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
