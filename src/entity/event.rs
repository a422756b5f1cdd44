use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::WalletID;

/// Discriminant used to subscribe to and filter domain events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    TransactionStatusUpdated,
    TokenListMerged,
    AccountsBalancesUpdated,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::TransactionStatusUpdated => write!(f, "TransactionStatusUpdated"),
            EventType::TokenListMerged => write!(f, "TokenListMerged"),
            EventType::AccountsBalancesUpdated => write!(f, "AccountsBalancesUpdated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainEvent {
    /// One or more transactions changed status or processing timestamp.
    TransactionStatusUpdated,
    TokenListMerged,
    AccountsBalancesUpdated { wallet_id: WalletID },
}

impl DomainEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            DomainEvent::TransactionStatusUpdated => EventType::TransactionStatusUpdated,
            DomainEvent::TokenListMerged => EventType::TokenListMerged,
            DomainEvent::AccountsBalancesUpdated { .. } => EventType::AccountsBalancesUpdated,
        }
    }
}
