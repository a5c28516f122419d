//! Settlement Submitter: closes one actionable instance with a single
//! best-effort transaction.
//!
//! Fee escalation is static: the baseline gas price is read immediately
//! before each submission and multiplied by a fixed factor. There is no
//! in-pass retry ladder: a submission that fails leaves the instance
//! actionable, and the next pass attempts it again with a fresh fee read.
//! The contract rejects a close of an already-ended instance, which is the
//! safety backstop when another settler wins the race between scan and
//! submit.

use std::time::Duration;
use tracing::{info, warn};

use lottery_abi::{calls, Address};

use crate::error::SettleError;
use crate::ledger::Ledger;
use crate::signer::{CallTx, TxSigner};

/// How often the receipt is polled during the confirmation wait.
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleOutcome {
    Submitted { tx_hash: String },
    /// Dry-run mode: everything up to signing was exercised, nothing sent.
    Skipped,
}

pub struct Submitter<'a> {
    ledger: &'a dyn Ledger,
    signer: &'a TxSigner,
    contract: Address,
    fee_multiplier: u64,
    confirm_timeout: Duration,
    dry_run: bool,
}

impl<'a> Submitter<'a> {
    pub fn new(
        ledger: &'a dyn Ledger,
        signer: &'a TxSigner,
        contract: Address,
        fee_multiplier: u64,
        confirm_timeout: Duration,
        dry_run: bool,
    ) -> Self {
        Self {
            ledger,
            signer,
            contract,
            fee_multiplier,
            confirm_timeout,
            dry_run,
        }
    }

    /// Submit one closing transaction for `id` at the escalated fee.
    ///
    /// Returns once the ledger has acknowledged the submission (and, if
    /// configured, once the receipt has been seen). Every failure maps to
    /// a [`SettleError`] variant and aborts this instance only.
    pub async fn settle(&self, id: u64) -> Result<SettleOutcome, SettleError> {
        let baseline = self
            .ledger
            .current_network_fee()
            .await
            .map_err(SettleError::Fee)?;
        let gas_price = baseline.saturating_mul(u128::from(self.fee_multiplier.max(1)));

        let call_data = calls::end_lottery_call(id);
        let gas = self
            .ledger
            .estimate_cost(self.signer.address(), &call_data)
            .await
            .map_err(SettleError::Estimate)?;

        info!(
            "lottery {}: closing (gas={}, gas_price={} wei, baseline={} wei)",
            id, gas, gas_price, baseline
        );

        if self.dry_run {
            info!("lottery {}: dry_run=true, not submitting", id);
            return Ok(SettleOutcome::Skipped);
        }

        let nonce = self
            .ledger
            .pending_nonce(self.signer.address())
            .await
            .map_err(SettleError::Nonce)?;

        let tx = CallTx {
            nonce,
            gas_price,
            gas,
            to: self.contract,
            value: 0,
            data: call_data,
        };
        let raw = self.signer.sign_call(&tx).map_err(SettleError::Sign)?;

        let tx_hash = self.ledger.submit(&raw).await.map_err(SettleError::Submit)?;

        if !self.confirm_timeout.is_zero() {
            self.await_receipt(id, &tx_hash).await?;
        }

        Ok(SettleOutcome::Submitted { tx_hash })
    }

    /// Poll the receipt until success, revert, or timeout. A timeout is a
    /// warning, not a failure: the acknowledgement already happened and the
    /// next pass re-reads `ended` from the ledger anyway.
    async fn await_receipt(&self, id: u64, tx_hash: &str) -> Result<(), SettleError> {
        let start = tokio::time::Instant::now();
        loop {
            match self.ledger.confirmed(tx_hash).await {
                Ok(Some(true)) => {
                    info!("lottery {}: confirmed {}", id, tx_hash);
                    return Ok(());
                }
                Ok(Some(false)) => {
                    return Err(SettleError::Reverted(tx_hash.to_string()));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("lottery {}: receipt poll failed: {}", id, e);
                }
            }
            if start.elapsed() >= self.confirm_timeout {
                warn!(
                    "lottery {}: no receipt for {} within {:?}, leaving to next pass",
                    id, tx_hash, self.confirm_timeout
                );
                return Ok(());
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}
