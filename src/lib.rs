pub mod amount;
pub mod config;
pub mod http;
pub mod ledger;
pub mod model;
pub mod report;
pub mod service;
pub mod verifier;

pub use amount::Amount;
pub use ledger::{Ledger, LedgerError};
pub use model::{Balance, CustomerId, PostRequest, Statement, Transaction, TransactionKind};
pub use service::LedgerService;
pub use verifier::{VerificationReport, Verifier, VerifyError};
