//! Event types flowing between the feed, the watchers, and the reporter.
//!
//! Raw feed payloads are decoded and classified here before anything
//! downstream sees them.

mod balance_events;
pub mod codec;

pub use balance_events::{BalanceEvent, ChangeNotification};
pub use codec::{decode_account_record, AccountData, AccountInfo, CodecError};
