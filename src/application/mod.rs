//! Application layer containing the shipment business logic.
//!
//! `handler` holds the state transitions run by the transaction processor,
//! `client` builds and submits signed transactions, and `ledger` is a local,
//! single-process validator that runs batches through the handler.

pub mod client;
pub mod handler;
pub mod ledger;
