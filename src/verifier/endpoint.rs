use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::ledger::LedgerError;
use crate::model::{Balance, CustomerId, PostRequest, Statement};
use crate::service::LedgerService;

/// A failure to get an answer from an endpoint at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("unexpected status {0}")]
    UnexpectedStatus(u16),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request task failed: {0}")]
    Task(String),
}

/// Outcome of a request that did not yield a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    /// The ledger answered and refused the transaction.
    #[error("rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl EndpointError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, EndpointError::Rejected(_))
    }
}

impl From<LedgerError> for EndpointError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Unavailable => {
                EndpointError::Transport(TransportError::Connection(err.to_string()))
            }
            rejection => EndpointError::Rejected(rejection.to_string()),
        }
    }
}

/// Something the verifier can post transactions to and read statements from.
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// Label used in logs and reports.
    fn name(&self) -> String;

    async fn post(
        &self,
        customer: CustomerId,
        request: PostRequest,
    ) -> Result<Balance, EndpointError>;

    async fn statement(&self, customer: CustomerId) -> Result<Statement, EndpointError>;
}

/// An in-process ledger, reached without any transport.
#[derive(Debug, Clone)]
pub struct LocalEndpoint {
    name: String,
    service: LedgerService,
}

impl LocalEndpoint {
    pub fn new(name: impl Into<String>, service: LedgerService) -> Self {
        Self {
            name: name.into(),
            service,
        }
    }
}

#[async_trait]
impl Endpoint for LocalEndpoint {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn post(
        &self,
        customer: CustomerId,
        request: PostRequest,
    ) -> Result<Balance, EndpointError> {
        Ok(self.service.post(customer, request).await?)
    }

    async fn statement(&self, customer: CustomerId) -> Result<Statement, EndpointError> {
        Ok(self.service.statement(customer).await?)
    }
}
