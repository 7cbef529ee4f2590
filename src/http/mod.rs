//! HTTP transport for the ledger: the axum routes served by each listener
//! and the client endpoint the verifier drives them with.

mod client;
mod server;
pub mod wire;

pub use client::HttpEndpoint;
pub use server::{GET_STATEMENT, POST_TRANSACTION, router, serve};
