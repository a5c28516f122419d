//! Expiry Scanner: walks every lottery instance on the ledger and yields
//! the ids whose entry window has elapsed but which the contract still
//! reports as open.
//!
//! Strictly read-only. A fresh scan is built each pass and re-derives
//! everything from the ledger; nothing about actionability is cached
//! between passes.

use tracing::warn;

use crate::error::LedgerError;
use crate::ledger::Ledger;

pub struct ExpiryScan<'a> {
    ledger: &'a dyn Ledger,
    count: u64,
    next_id: u64,
}

impl<'a> ExpiryScan<'a> {
    /// Read the instance count and position the scan at id 1.
    ///
    /// A count failure means the ledger is unreachable as a whole; the
    /// caller aborts the pass and relies on the next tick.
    pub async fn begin(ledger: &'a dyn Ledger) -> Result<ExpiryScan<'a>, LedgerError> {
        let count = ledger.count().await?;
        Ok(Self {
            ledger,
            count,
            next_id: 1,
        })
    }

    /// Total instances this scan will examine.
    pub fn total(&self) -> u64 {
        self.count
    }

    /// Next actionable id in ascending order, or `None` when the scan is
    /// exhausted.
    ///
    /// Wall-clock time is sampled once per instance check, so a long scan
    /// cannot hold a stale `now` against late instances. A failed fetch
    /// skips that instance for this pass only.
    pub async fn next_actionable(&mut self) -> Option<u64> {
        while self.next_id <= self.count {
            let id = self.next_id;
            self.next_id += 1;

            let record = match self.ledger.get(id).await {
                Ok(r) => r,
                Err(e) => {
                    warn!("lottery {}: fetch failed, skipping this pass: {}", id, e);
                    continue;
                }
            };

            if record.is_actionable(unix_now()) {
                return Some(id);
            }
        }
        None
    }
}

/// Current unix time in seconds.
pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs()
}
