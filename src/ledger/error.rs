//! Error types for ledger operations.

use thiserror::Error;

use crate::Amount;
use crate::model::CustomerId;

/// Rejection returned by [`Ledger::post`](super::Ledger::post) and
/// [`Ledger::statement`](super::Ledger::statement).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("customer {0} not found")]
    CustomerNotFound(CustomerId),

    #[error(
        "insufficient funds for customer {customer}: balance {balance}, limit {limit}, requested {requested}"
    )]
    InsufficientFunds {
        customer: CustomerId,
        balance: Amount,
        limit: Amount,
        requested: Amount,
    },

    #[error("amount must be a positive integer, got {0}")]
    InvalidAmount(Amount),

    #[error("crediting {requested} would overflow the balance of customer {customer}")]
    AmountOverflow {
        customer: CustomerId,
        requested: Amount,
    },

    #[error("ledger is no longer running")]
    Unavailable,
}
