//! Core domain types for the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Amount;

/// Customer identifier.
pub type CustomerId = u32;

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Subtract from the balance, bounded by the customer's limit.
    #[serde(rename = "d")]
    Debit,
    /// Add to the balance.
    #[serde(rename = "c")]
    Credit,
}

impl TransactionKind {
    /// The amount as it affects the balance: negative for debits.
    pub fn signed(self, amount: Amount) -> Amount {
        match self {
            TransactionKind::Debit => -amount,
            TransactionKind::Credit => amount,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Debit => "debit",
            TransactionKind::Credit => "credit",
        }
    }
}

/// A transaction command, as parsed from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRequest {
    pub amount: Amount,
    pub kind: TransactionKind,
    pub description: String,
}

impl PostRequest {
    pub fn debit(amount: i64, description: impl Into<String>) -> Self {
        Self {
            amount: Amount::new(amount),
            kind: TransactionKind::Debit,
            description: description.into(),
        }
    }

    pub fn credit(amount: i64, description: impl Into<String>) -> Self {
        Self {
            amount: Amount::new(amount),
            kind: TransactionKind::Credit,
            description: description.into(),
        }
    }
}

/// An accepted transaction. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub amount: Amount,
    pub kind: TransactionKind,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Balance committed by an accepted post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    pub balance: Amount,
    pub limit: Amount,
}

/// Point-in-time view of an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub balance: Amount,
    pub limit: Amount,
    pub as_of: DateTime<Utc>,
    /// Most recent accepted transactions, newest first. Earlier servers of
    /// this API listed them oldest first; clients relying on that must reverse.
    pub recent_transactions: Vec<Transaction>,
}
