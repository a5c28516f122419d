//! Scheduler Loop: drives scan-and-settle passes, one at a time.
//!
//! Both trigger mechanisms (the interval timer and the HTTP handler) feed
//! the same single-slot channel, and a single task drains it, so passes can
//! never overlap regardless of where they were requested. The signing
//! context lives in this task and nowhere else.
//!
//! Shutdown is observed between passes only; an in-flight pass always runs
//! to completion before the loop exits.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use lottery_abi::Address;

use crate::config::SettlerConfig;
use crate::ledger::Ledger;
use crate::scanner::ExpiryScan;
use crate::signer::TxSigner;
use crate::submitter::{SettleOutcome, Submitter};

/// What asked for a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassTrigger {
    Tick,
    Request,
}

/// Outcome counts for one completed pass.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PassSummary {
    pub number: u64,
    pub scanned: u64,
    pub actionable: u64,
    pub settled: u64,
    pub failed: u64,
}

/// Shared with the liveness endpoint.
#[derive(Default)]
pub struct SchedulerState {
    pub passes: AtomicU64,
    pub last_pass: Mutex<Option<PassSummary>>,
}

/// Enqueue a pass every `every`, starting immediately. Ticks that arrive
/// while a pass is still queued or running coalesce into it.
pub fn spawn_interval_trigger(
    triggers: mpsc::Sender<PassTrigger>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if triggers.try_send(PassTrigger::Tick).is_err() {
                debug!("pass already pending, coalescing tick");
            }
        }
    })
}

/// One full scan-and-settle pass. Returns `None` when the instance count
/// itself was unreadable (total ledger unavailability; nothing else was
/// attempted).
pub async fn run_pass(
    ledger: &dyn Ledger,
    submitter: &Submitter<'_>,
    number: u64,
) -> Option<PassSummary> {
    info!("── Pass #{} ──", number);

    let mut scan = match ExpiryScan::begin(ledger).await {
        Ok(scan) => scan,
        Err(e) => {
            error!("pass #{} aborted, instance count unavailable: {}", number, e);
            return None;
        }
    };

    let mut summary = PassSummary {
        number,
        scanned: scan.total(),
        actionable: 0,
        settled: 0,
        failed: 0,
    };

    while let Some(id) = scan.next_actionable().await {
        summary.actionable += 1;
        match submitter.settle(id).await {
            Ok(SettleOutcome::Submitted { tx_hash }) => {
                summary.settled += 1;
                info!("lottery {} settled: {}", id, tx_hash);
            }
            Ok(SettleOutcome::Skipped) => {
                summary.settled += 1;
            }
            Err(e) => {
                summary.failed += 1;
                warn!("lottery {} settlement failed, retrying next pass: {}", id, e);
            }
        }
    }

    info!(
        "pass #{} done: {} scanned, {} actionable, {} settled, {} failed",
        summary.number, summary.scanned, summary.actionable, summary.settled, summary.failed
    );
    Some(summary)
}

/// Drain triggers until shutdown. Owns the signing context for the life of
/// the process.
pub async fn run(
    config: &SettlerConfig,
    ledger: &dyn Ledger,
    signer: &TxSigner,
    contract: Address,
    state: &SchedulerState,
    mut triggers: mpsc::Receiver<PassTrigger>,
) {
    let submitter = Submitter::new(
        ledger,
        signer,
        contract,
        config.fee_multiplier,
        Duration::from_secs(config.confirm_timeout_secs),
        config.dry_run,
    );

    loop {
        let trigger = tokio::select! {
            trigger = triggers.recv() => match trigger {
                Some(t) => t,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        };

        if trigger == PassTrigger::Request {
            debug!("pass requested over http");
        }

        let number = state.passes.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(summary) = run_pass(ledger, &submitter, number).await {
            *state.last_pass.lock().expect("pass summary lock") = Some(summary);
        }
    }

    info!(
        "scheduler stopped after {} pass(es)",
        state.passes.load(Ordering::Relaxed)
    );
}
