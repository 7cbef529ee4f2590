//! In-memory customer ledger.
//!
//! The ledger holds one [`Account`] per customer and applies debits and
//! credits to it. It has no internal locking: it is meant to be owned by a
//! single task that drains a stream of [`Command`]s (see [`Ledger::run`]), so
//! every check-then-commit sequence runs to completion before the next command
//! is looked at.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::oneshot;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info};

use crate::Amount;
use crate::config::LedgerConfig;
use crate::model::{Balance, CustomerId, PostRequest, Statement, Transaction, TransactionKind};

mod account;
pub use account::{Account, RING_CAPACITY, TransactionRing};

mod error;
pub use error::LedgerError;

/// A request to the task owning the ledger, with the channel to reply on.
#[derive(Debug)]
pub enum Command {
    Post {
        customer: CustomerId,
        request: PostRequest,
        reply: oneshot::Sender<Result<Balance, LedgerError>>,
    },
    Statement {
        customer: CustomerId,
        reply: oneshot::Sender<Result<Statement, LedgerError>>,
    },
}

/// The customer accounts and the rules for posting to them.
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: HashMap<CustomerId, Account>,
}

/// Public API
impl Ledger {
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
        }
    }

    /// Build a ledger with every customer of the configured table at balance 0.
    pub fn from_config(config: &LedgerConfig) -> Self {
        let mut ledger = Self::new();
        for &(customer, limit) in &config.customers {
            ledger.open_account(customer, limit);
        }
        ledger
    }

    /// Open (or reset) a customer account with the given limit.
    pub fn open_account(&mut self, customer: CustomerId, limit: Amount) {
        self.accounts.insert(customer, Account::new(limit));
    }

    pub fn account(&self, customer: CustomerId) -> Option<&Account> {
        self.accounts.get(&customer)
    }

    /// Serve commands until every sender of the stream is dropped.
    pub async fn run(mut self, mut commands: impl Stream<Item = Command> + Unpin) {
        while let Some(command) = commands.next().await {
            self.handle(command);
        }
        debug!("command stream closed, ledger stopped");
    }

    /// Apply one transaction to a customer's account.
    ///
    /// A debit whose resulting balance would fall below `-limit` is rejected
    /// and leaves the account untouched. An accepted transaction changes the
    /// balance once and overwrites exactly one ring slot.
    pub fn post(
        &mut self,
        customer: CustomerId,
        request: PostRequest,
    ) -> Result<Balance, LedgerError> {
        let kind = request.kind;
        let amount = request.amount;
        let result = self.apply_post(customer, request);
        Self::log_result(customer, kind, amount, &result);
        result
    }

    /// Snapshot of the balance and the recorded transactions, newest first.
    pub fn statement(&self, customer: CustomerId) -> Result<Statement, LedgerError> {
        let account = self
            .accounts
            .get(&customer)
            .ok_or(LedgerError::CustomerNotFound(customer))?;

        Ok(Statement {
            balance: account.balance(),
            limit: account.limit(),
            as_of: Utc::now(),
            recent_transactions: account.transactions().recent().cloned().collect(),
        })
    }
}

/// Private API
impl Ledger {
    fn handle(&mut self, command: Command) {
        // a caller that stopped waiting is not an error for the ledger
        match command {
            Command::Post {
                customer,
                request,
                reply,
            } => {
                let _ = reply.send(self.post(customer, request));
            }
            Command::Statement { customer, reply } => {
                let _ = reply.send(self.statement(customer));
            }
        }
    }

    fn apply_post(
        &mut self,
        customer: CustomerId,
        request: PostRequest,
    ) -> Result<Balance, LedgerError> {
        if !request.amount.is_positive() {
            return Err(LedgerError::InvalidAmount(request.amount));
        }

        let account = self
            .accounts
            .get_mut(&customer)
            .ok_or(LedgerError::CustomerNotFound(customer))?;

        let candidate = match request.kind {
            TransactionKind::Debit => account
                .balance()
                .checked_sub(request.amount)
                .filter(|candidate| *candidate >= account.floor())
                .ok_or(LedgerError::InsufficientFunds {
                    customer,
                    balance: account.balance(),
                    limit: account.limit(),
                    requested: request.amount,
                })?,
            TransactionKind::Credit => account
                .balance()
                .checked_add(request.amount)
                .ok_or(LedgerError::AmountOverflow {
                    customer,
                    requested: request.amount,
                })?,
        };

        account.commit(
            candidate,
            Transaction {
                amount: request.amount,
                kind: request.kind,
                description: request.description,
                created_at: Utc::now(),
            },
        );

        Ok(Balance {
            balance: candidate,
            limit: account.limit(),
        })
    }

    fn log_result(
        customer: CustomerId,
        kind: TransactionKind,
        amount: Amount,
        result: &Result<Balance, LedgerError>,
    ) {
        match result {
            Ok(committed) => {
                debug!(
                    customer = %customer,
                    amount = %amount,
                    balance = %committed.balance,
                    "{} applied",
                    kind.as_str()
                );
            }
            Err(e) => {
                info!(
                    customer = %customer,
                    amount = %amount,
                    reason = %e,
                    "{} skipped",
                    kind.as_str()
                );
            }
        }
    }
}
