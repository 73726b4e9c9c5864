//! Normalized balance events emitted by the watchers.
//!
//! Raw feed payloads never reach the reporting layer directly: each
//! notification is decoded, classified against the last known balance,
//! and surfaced as a `BalanceEvent`. Every event carries a timestamp.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::accounts::UnitScale;

/// An opaque payload from a change-notification feed.
///
/// Holds the raw SCALE bytes of the account record; consumed and dropped
/// once decoded.
#[derive(Debug, Clone)]
pub struct ChangeNotification {
    pub raw: Vec<u8>,
    pub received_at: DateTime<Utc>,
}

impl ChangeNotification {
    pub fn new(raw: Vec<u8>) -> Self {
        Self {
            raw,
            received_at: Utc::now(),
        }
    }
}

/// A reportable balance change for one watched account.
///
/// Amounts are in planks; rendering converts them with the configured
/// `UnitScale`. An unchanged balance produces no event at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceEvent {
    /// Balance increased by `amount` planks.
    Gained {
        label: String,
        amount: u128,
        new_balance: u128,
        at: DateTime<Utc>,
    },

    /// Balance decreased by `amount` planks.
    Lost {
        label: String,
        amount: u128,
        new_balance: u128,
        at: DateTime<Utc>,
    },
}

impl BalanceEvent {
    /// Classifies a balance transition, returning `None` when nothing
    /// changed (non-balance-affecting notifications are silently absorbed).
    ///
    /// Computed in unsigned space on the larger side, so there is no
    /// signed-overflow corner even for extreme balances.
    pub fn from_transition(label: &str, old: u128, new: u128) -> Option<Self> {
        match new.cmp(&old) {
            Ordering::Greater => Some(Self::Gained {
                label: label.to_string(),
                amount: new - old,
                new_balance: new,
                at: Utc::now(),
            }),
            Ordering::Less => Some(Self::Lost {
                label: label.to_string(),
                amount: old - new,
                new_balance: new,
                at: Utc::now(),
            }),
            Ordering::Equal => None,
        }
    }

    /// Returns the label of the account this event belongs to.
    pub fn label(&self) -> &str {
        match self {
            Self::Gained { label, .. } => label,
            Self::Lost { label, .. } => label,
        }
    }

    /// Returns the balance after the change, in planks.
    pub fn new_balance(&self) -> u128 {
        match self {
            Self::Gained { new_balance, .. } => *new_balance,
            Self::Lost { new_balance, .. } => *new_balance,
        }
    }

    /// Returns the timestamp of this event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Gained { at, .. } => *at,
            Self::Lost { at, .. } => *at,
        }
    }

    /// Renders the one-line report for this event.
    pub fn render(&self, scale: &UnitScale) -> String {
        match self {
            Self::Gained {
                label,
                amount,
                new_balance,
                ..
            } => format!(
                "{} gained {} and now has {}",
                label,
                scale.to_dot_string(*amount),
                scale.to_dot_string(*new_balance)
            ),
            Self::Lost {
                label,
                amount,
                new_balance,
                ..
            } => format!(
                "{} lost {} and now has {}",
                label,
                scale.to_dot_string(*amount),
                scale.to_dot_string(*new_balance)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_classification() {
        let event = BalanceEvent::from_transition("alice", 1000, 1500).unwrap();
        assert!(matches!(
            event,
            BalanceEvent::Gained {
                amount: 500,
                new_balance: 1500,
                ..
            }
        ));
        assert_eq!(event.label(), "alice");
    }

    #[test]
    fn test_loss_classification() {
        let event = BalanceEvent::from_transition("bob", 1500, 200).unwrap();
        assert!(matches!(
            event,
            BalanceEvent::Lost {
                amount: 1300,
                new_balance: 200,
                ..
            }
        ));
    }

    #[test]
    fn test_unchanged_balance_produces_no_event() {
        assert!(BalanceEvent::from_transition("alice", 1500, 1500).is_none());
        assert!(BalanceEvent::from_transition("alice", 0, 0).is_none());
    }

    #[test]
    fn test_extreme_balances_do_not_overflow() {
        let event = BalanceEvent::from_transition("alice", 0, u128::MAX).unwrap();
        assert_eq!(event.new_balance(), u128::MAX);

        let event = BalanceEvent::from_transition("alice", u128::MAX, 0).unwrap();
        assert!(matches!(
            event,
            BalanceEvent::Lost {
                amount: u128::MAX,
                ..
            }
        ));
    }

    #[test]
    fn test_render_worked_example() {
        let scale = UnitScale::new(100);

        let gain = BalanceEvent::from_transition("alice", 1000, 1500).unwrap();
        assert_eq!(gain.render(&scale), "alice gained 5.00 and now has 15.00");

        let loss = BalanceEvent::from_transition("alice", 1500, 200).unwrap();
        assert_eq!(loss.render(&scale), "alice lost 13.00 and now has 2.00");
    }
}
