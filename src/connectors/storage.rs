//! Storage-key construction for `System.Account` records.
//!
//! Substrate addresses a map entry by hashing the pallet and item names
//! with twox128 and the map key with blake2_128_concat, then
//! concatenating the pieces.

use std::hash::Hasher;

use blake2::digest::{Update, VariableOutput};
use blake2::Blake2bVar;
use twox_hash::XxHash64;

use crate::accounts::AccountId;

/// A raw storage key; the subscription scope for one account's record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKey(Vec<u8>);

impl StorageKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Hex form with `0x` prefix, as JSON-RPC expects it.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Builds the storage key of the `System.Account` entry for `id`.
pub fn system_account_key(id: &AccountId) -> StorageKey {
    let mut key = Vec::with_capacity(32 + 16 + 32);
    key.extend_from_slice(&twox_128(b"System"));
    key.extend_from_slice(&twox_128(b"Account"));
    key.extend_from_slice(&blake2_128_concat(id.as_bytes()));
    StorageKey(key)
}

/// twox128: two seeded XXH64 halves, little-endian, concatenated.
fn twox_128(data: &[u8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    for seed in 0..2u64 {
        let mut hasher = XxHash64::with_seed(seed);
        hasher.write(data);
        let half = hasher.finish().to_le_bytes();
        out[seed as usize * 8..][..8].copy_from_slice(&half);
    }
    out
}

/// blake2_128_concat: a 16-byte blake2b digest followed by the key itself.
fn blake2_128_concat(data: &[u8]) -> Vec<u8> {
    let mut hasher = Blake2bVar::new(16).expect("16 is a valid blake2b output size");
    hasher.update(data);
    let mut digest = [0u8; 16];
    hasher
        .finalize_variable(&mut digest)
        .expect("output buffer matches digest size");

    let mut out = Vec::with_capacity(16 + data.len());
    out.extend_from_slice(&digest);
    out.extend_from_slice(data);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::PublicKey;

    #[test]
    fn test_twox128_known_vectors() {
        assert_eq!(
            hex::encode(twox_128(b"System")),
            "26aa394eea5630e07c48ae0c9558cef7"
        );
        assert_eq!(
            hex::encode(twox_128(b"Account")),
            "b99d880ec681799c0cf30e8886371da9"
        );
    }

    #[test]
    fn test_alice_system_account_key() {
        // Well-known dev-chain key for Alice's System.Account entry.
        let pk = PublicKey::from_hex(
            "0xd43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d",
        )
        .unwrap();
        let key = system_account_key(&AccountId::from(&pk));

        let expected = concat!(
            "0x26aa394eea5630e07c48ae0c9558cef7b99d880ec681799c0cf30e8886371da9",
            "de1e86a9a8c739864cf3cc5ec2bea59f",
            "d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d",
        );
        assert_eq!(key.to_hex(), expected);
    }

    #[test]
    fn test_key_embeds_account_id() {
        let pk = PublicKey::from_hex(
            "0x8eaf04151687736326c9fea17e25fc5287613693c912909cb226aa4794f26a48",
        )
        .unwrap();
        let id = AccountId::from(&pk);
        let key = system_account_key(&id);

        // 16 + 16 pallet/item prefix, 16 digest, 32 raw id.
        assert_eq!(key.as_bytes().len(), 80);
        assert_eq!(&key.as_bytes()[48..], id.as_bytes());
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let pk = PublicKey::from_hex(
            "0xd43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d",
        )
        .unwrap();
        let id = AccountId::from(&pk);
        assert_eq!(system_account_key(&id), system_account_key(&id));
    }
}
