//! Error taxonomy for the settlement daemon.
//!
//! Every per-instance error is caught and logged at the pass level; nothing
//! here is allowed to crash the scheduler loop. Only startup-time failures
//! terminate the process, and those exit directly from `main`.

use thiserror::Error;

/// Errors surfaced by the ledger client.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a JSON-RPC error object.
    #[error("rpc error: {0}")]
    Rpc(String),

    /// The endpoint answered 200 but the payload did not decode.
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Per-instance settlement failures. All of these abort the current
/// instance only; the instance stays actionable and is retried next pass.
#[derive(Error, Debug)]
pub enum SettleError {
    #[error("fee read failed: {0}")]
    Fee(#[source] LedgerError),

    #[error("gas estimate failed: {0}")]
    Estimate(#[source] LedgerError),

    #[error("nonce read failed: {0}")]
    Nonce(#[source] LedgerError),

    #[error("signing failed: {0}")]
    Sign(String),

    #[error("submission failed: {0}")]
    Submit(#[source] LedgerError),

    /// The closing transaction was mined but reverted, typically because
    /// another actor closed the instance first.
    #[error("transaction {0} reverted")]
    Reverted(String),
}
