//! Handle to a running ledger.
//!
//! [`LedgerService::spawn`] moves a [`Ledger`] into its own task and returns a
//! cloneable handle. Every clone talks to the same task through one bounded
//! channel, so concurrent callers are serialized by the task and never by the
//! callers themselves.

use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;

use crate::config::{LedgerConfig, Topology};
use crate::ledger::{Command, Ledger, LedgerError};
use crate::model::{Balance, CustomerId, PostRequest, Statement};

#[derive(Debug, Clone)]
pub struct LedgerService {
    sender: mpsc::Sender<Command>,
}

impl LedgerService {
    /// Start a task owning `ledger`. Must be called within a tokio runtime.
    ///
    /// The task stops once every handle has been dropped.
    pub fn spawn(ledger: Ledger, mailbox_capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(mailbox_capacity.max(1));
        tokio::spawn(ledger.run(ReceiverStream::new(receiver)));
        Self { sender }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::spawn(Ledger::from_config(config), config.mailbox_capacity)
    }

    pub async fn post(
        &self,
        customer: CustomerId,
        request: PostRequest,
    ) -> Result<Balance, LedgerError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Command::Post {
                customer,
                request,
                reply,
            })
            .await
            .map_err(|_| LedgerError::Unavailable)?;
        response.await.map_err(|_| LedgerError::Unavailable)?
    }

    pub async fn statement(&self, customer: CustomerId) -> Result<Statement, LedgerError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Command::Statement { customer, reply })
            .await
            .map_err(|_| LedgerError::Unavailable)?;
        response.await.map_err(|_| LedgerError::Unavailable)?
    }

    /// True when both handles reach the same ledger task.
    pub fn same_ledger(&self, other: &LedgerService) -> bool {
        self.sender.same_channel(&other.sender)
    }
}

/// One service per listener, wired according to `topology`.
///
/// `Shared` hands out clones of a single service. `Isolated` starts a separate
/// ledger for each listener, each seeded from the same customer table.
pub fn deploy(topology: Topology, instances: usize, config: &LedgerConfig) -> Vec<LedgerService> {
    match topology {
        Topology::Shared => {
            let service = LedgerService::from_config(config);
            vec![service; instances]
        }
        Topology::Isolated => (0..instances)
            .map(|_| LedgerService::from_config(config))
            .collect(),
    }
}
