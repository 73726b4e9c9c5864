//! SCALE decoding of on-chain account records.
//!
//! The `System.Account` storage value is an `AccountInfo` struct; the
//! monitor only consumes the `free` field of its balance data.

use parity_scale_codec::{Decode, Encode, Error as ScaleError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed account record: {0}")]
    Malformed(#[from] ScaleError),
}

/// Balance data portion of an account record. All amounts are in planks.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct AccountData {
    pub free: u128,
    pub reserved: u128,
    pub misc_frozen: u128,
    pub fee_frozen: u128,
}

/// The `System.Account` record as stored on chain.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct AccountInfo {
    pub nonce: u32,
    pub consumers: u32,
    pub providers: u32,
    pub data: AccountData,
}

impl AccountInfo {
    /// The free balance, in planks.
    pub fn free(&self) -> u128 {
        self.data.free
    }
}

/// Decodes a raw storage value into an account record.
pub fn decode_account_record(raw: &[u8]) -> Result<AccountInfo, CodecError> {
    let mut input = raw;
    Ok(AccountInfo::decode(&mut input)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_free(free: u128) -> AccountInfo {
        AccountInfo {
            nonce: 0,
            consumers: 0,
            providers: 1,
            data: AccountData {
                free,
                reserved: 0,
                misc_frozen: 0,
                fee_frozen: 0,
            },
        }
    }

    #[test]
    fn test_decode_account_record() {
        let record = record_with_free(1500);
        let raw = record.encode();

        let decoded = decode_account_record(&raw).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.free(), 1500);
    }

    #[test]
    fn test_decode_rejects_truncated_input() {
        let raw = record_with_free(1500).encode();
        assert!(matches!(
            decode_account_record(&raw[..raw.len() - 1]),
            Err(CodecError::Malformed(_))
        ));
        assert!(decode_account_record(&[]).is_err());
    }

    #[test]
    fn test_record_layout_is_fixed_width() {
        // 3 x u32 header plus 4 x u128 balance data.
        assert_eq!(record_with_free(0).encode().len(), 12 + 64);
    }
}
