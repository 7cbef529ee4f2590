//! Concurrent lost-update verifier.
//!
//! The verifier reads a customer's balance, fires a batch of identical
//! transactions at one or more endpoints all at once, waits for every one of
//! them, reads the balance again and checks that nothing was lost:
//!
//! ```text
//! expected = before + signed(amount) * accepted
//! ```
//!
//! Rejected and failed requests are tallied separately and contribute nothing
//! to the expectation. The balance is always read from the first endpoint, so
//! spreading traffic over endpoints that do not share a ledger shows up as a
//! mismatch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::Amount;
use crate::config::VerifierConfig;
use crate::model::{CustomerId, PostRequest, TransactionKind};

mod endpoint;
pub use endpoint::{Endpoint, EndpointError, LocalEndpoint, TransportError};

/// Errors that end a verification run.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("no endpoints configured")]
    NoEndpoints,

    #[error("amount per transaction must be positive, got {0}")]
    InvalidAmount(Amount),

    #[error("failed to read the {stage} statement from {endpoint}: {source}")]
    Statement {
        stage: &'static str,
        endpoint: String,
        source: EndpointError,
    },

    #[error(
        "final balance {observed} does not match expected {expected}; \
         make sure nothing else posts to this customer while the check runs"
    )]
    BalanceMismatch { observed: Amount, expected: Amount },

    #[error("expected balance overflows: {before} + {accepted} x {signed}")]
    ExpectedOverflow {
        before: Amount,
        signed: Amount,
        accepted: u64,
    },
}

/// Per-endpoint request outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointTally {
    pub endpoint: String,
    pub dispatched: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub failed: u64,
}

/// Everything observed during one run.
#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub customer: CustomerId,
    pub kind: TransactionKind,
    pub amount: Amount,
    pub balance_before: Amount,
    pub balance_after: Amount,
    pub endpoints: Vec<EndpointTally>,
    pub elapsed: Duration,
}

impl VerificationReport {
    pub fn dispatched(&self) -> u64 {
        self.endpoints.iter().map(|t| t.dispatched).sum()
    }

    pub fn accepted(&self) -> u64 {
        self.endpoints.iter().map(|t| t.accepted).sum()
    }

    pub fn rejected(&self) -> u64 {
        self.endpoints.iter().map(|t| t.rejected).sum()
    }

    pub fn failed(&self) -> u64 {
        self.endpoints.iter().map(|t| t.failed).sum()
    }

    /// Balance implied by the accepted requests only, `None` if it does not
    /// fit in an `i64`.
    pub fn expected(&self) -> Option<Amount> {
        self.shifted_by(self.accepted())
    }

    /// Balance if every dispatched request had been accepted.
    pub fn nominal_expected(&self) -> Option<Amount> {
        self.shifted_by(self.dispatched())
    }

    /// An overflowing expectation never passes.
    pub fn passed(&self) -> bool {
        self.expected() == Some(self.balance_after)
    }

    pub fn ensure_conserved(&self) -> Result<(), VerifyError> {
        match self.expected() {
            Some(expected) if expected == self.balance_after => Ok(()),
            Some(expected) => Err(VerifyError::BalanceMismatch {
                observed: self.balance_after,
                expected,
            }),
            None => Err(VerifyError::ExpectedOverflow {
                before: self.balance_before,
                signed: self.kind.signed(self.amount),
                accepted: self.accepted(),
            }),
        }
    }

    fn shifted_by(&self, count: u64) -> Option<Amount> {
        let delta = self.kind.signed(self.amount).checked_times(count)?;
        self.balance_before.checked_add(delta)
    }
}

pub struct Verifier {
    customer: CustomerId,
    amount: Amount,
    count: u64,
    kind: TransactionKind,
    endpoints: Vec<Arc<dyn Endpoint>>,
}

impl Verifier {
    pub fn new(config: &VerifierConfig, endpoints: Vec<Arc<dyn Endpoint>>) -> Self {
        Self {
            customer: config.customer,
            amount: config.amount,
            count: config.count,
            kind: config.kind,
            endpoints,
        }
    }

    /// Run the check. A mismatch is not an error here; inspect the report with
    /// [`VerificationReport::ensure_conserved`].
    pub async fn run(&self) -> Result<VerificationReport, VerifyError> {
        if !self.amount.is_positive() {
            return Err(VerifyError::InvalidAmount(self.amount));
        }
        let primary = self.endpoints.first().ok_or(VerifyError::NoEndpoints)?;

        let balance_before = self.read_balance(primary.as_ref(), "initial").await?;
        info!(
            customer = %self.customer,
            balance = %balance_before,
            requests = self.count,
            endpoints = self.endpoints.len(),
            "starting concurrent {}s",
            self.kind.as_str()
        );

        let started = Instant::now();
        let endpoints = self.dispatch_all().await;
        let elapsed = started.elapsed();

        let balance_after = self.read_balance(primary.as_ref(), "final").await?;

        let report = VerificationReport {
            customer: self.customer,
            kind: self.kind,
            amount: self.amount,
            balance_before,
            balance_after,
            endpoints,
            elapsed,
        };
        Self::log_report(&report);
        Ok(report)
    }
}

impl Verifier {
    async fn read_balance(
        &self,
        endpoint: &dyn Endpoint,
        stage: &'static str,
    ) -> Result<Amount, VerifyError> {
        endpoint
            .statement(self.customer)
            .await
            .map(|statement| statement.balance)
            .map_err(|source| VerifyError::Statement {
                stage,
                endpoint: endpoint.name(),
                source,
            })
    }

    /// Spawn every request before awaiting any, then collect all outcomes.
    async fn dispatch_all(&self) -> Vec<EndpointTally> {
        let mut tallies: Vec<EndpointTally> = self
            .endpoints
            .iter()
            .map(|endpoint| EndpointTally {
                endpoint: endpoint.name(),
                ..EndpointTally::default()
            })
            .collect();

        let mut requests = Vec::new();
        for i in 0..self.count {
            let slot = (i % self.endpoints.len() as u64) as usize;
            let endpoint = Arc::clone(&self.endpoints[slot]);
            let request = PostRequest {
                amount: self.amount,
                kind: self.kind,
                description: format!("teste{i}"),
            };
            let customer = self.customer;

            let handle = tokio::spawn(async move { endpoint.post(customer, request).await });
            requests.push((slot, handle));
            tallies[slot].dispatched += 1;
        }
        debug!(requests = self.count, "all requests dispatched");

        // every task is already running, awaiting in order only collects
        for (slot, handle) in requests {
            let outcome = handle
                .await
                .unwrap_or_else(|e| Err(TransportError::Task(e.to_string()).into()));
            let tally = &mut tallies[slot];

            match outcome {
                Ok(_) => tally.accepted += 1,
                Err(e) if e.is_rejection() => {
                    debug!(endpoint = %tally.endpoint, reason = %e, "request rejected");
                    tally.rejected += 1;
                }
                Err(e) => {
                    warn!(endpoint = %tally.endpoint, reason = %e, "request failed");
                    tally.failed += 1;
                }
            }
        }

        tallies
    }

    fn log_report(report: &VerificationReport) {
        info!(
            accepted = report.accepted(),
            rejected = report.rejected(),
            failed = report.failed(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "all requests finished"
        );
        match report.expected() {
            Some(expected) if expected == report.balance_after => {
                info!(observed = %report.balance_after, %expected, "balance conserved");
            }
            Some(expected) => error!(
                observed = %report.balance_after,
                %expected,
                nominal = ?report.nominal_expected(),
                "balance mismatch, updates were lost"
            ),
            None => error!(
                observed = %report.balance_after,
                "expected balance overflows, nothing was checked"
            ),
        }
    }
}
