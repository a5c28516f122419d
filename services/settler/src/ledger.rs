//! The ledger client: read access to lottery records and submission of
//! signed closing transactions.
//!
//! The trait is the seam between the daemon's logic and the wire; scanner
//! and submitter tests run against an in-memory implementation. The ledger
//! is the sole source of truth; `ended` is always re-read here, never
//! cached locally.

use async_trait::async_trait;

use lottery_abi::{calls, decode_u64_word, Address, LotteryRecord, WORD};

use crate::error::LedgerError;
use crate::rpc::Rpc;

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Total number of lottery instances ever created.
    async fn count(&self) -> Result<u64, LedgerError>;

    /// One instance record by id.
    async fn get(&self, id: u64) -> Result<LotteryRecord, LedgerError>;

    /// Current baseline network fee (gas price) in wei.
    async fn current_network_fee(&self) -> Result<u128, LedgerError>;

    /// Gas estimate for a prospective contract call from `from`.
    async fn estimate_cost(&self, from: &Address, call_data: &[u8]) -> Result<u64, LedgerError>;

    /// Next usable nonce for the signing address.
    async fn pending_nonce(&self, addr: &Address) -> Result<u64, LedgerError>;

    /// Submit a signed raw transaction; returns the acknowledgement hash.
    async fn submit(&self, raw_tx: &[u8]) -> Result<String, LedgerError>;

    /// Receipt status: `None` until mined, then success/revert.
    async fn confirmed(&self, tx_hash: &str) -> Result<Option<bool>, LedgerError>;
}

/// JSON-RPC ledger client bound to one lottery contract.
pub struct EthLedger {
    rpc: Rpc,
    contract: Address,
}

impl EthLedger {
    pub fn new(rpc: Rpc, contract: Address) -> Self {
        Self { rpc, contract }
    }
}

#[async_trait]
impl Ledger for EthLedger {
    async fn count(&self) -> Result<u64, LedgerError> {
        let data = self
            .rpc
            .eth_call(&self.contract, &calls::lottery_count_call())
            .await?;
        if data.len() < WORD {
            return Err(LedgerError::Decode(format!(
                "lotteryCount returned {} bytes",
                data.len()
            )));
        }
        decode_u64_word(&data[..WORD]).map_err(LedgerError::Decode)
    }

    async fn get(&self, id: u64) -> Result<LotteryRecord, LedgerError> {
        let data = self
            .rpc
            .eth_call(&self.contract, &calls::lotteries_call(id))
            .await?;
        LotteryRecord::from_return_data(&data).map_err(LedgerError::Decode)
    }

    async fn current_network_fee(&self) -> Result<u128, LedgerError> {
        self.rpc.gas_price().await
    }

    async fn estimate_cost(&self, from: &Address, call_data: &[u8]) -> Result<u64, LedgerError> {
        self.rpc.estimate_gas(from, &self.contract, call_data).await
    }

    async fn pending_nonce(&self, addr: &Address) -> Result<u64, LedgerError> {
        self.rpc.transaction_count(addr).await
    }

    async fn submit(&self, raw_tx: &[u8]) -> Result<String, LedgerError> {
        self.rpc.send_raw_transaction(raw_tx).await
    }

    async fn confirmed(&self, tx_hash: &str) -> Result<Option<bool>, LedgerError> {
        self.rpc.transaction_receipt(tx_hash).await
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory ledger for scanner/submitter/scheduler tests.

    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    pub(crate) struct MockLedger {
        pub count: u64,
        pub records: HashMap<u64, LotteryRecord>,
        pub fail_count: bool,
        pub fail_get: HashSet<u64>,
        pub gas_price: u128,
        pub fail_submit: HashSet<u64>,
        pub receipt_status: Option<bool>,
        pub fee_reads: AtomicU64,
        /// Instance ids extracted from every submitted payload, failures included.
        pub attempts: Mutex<Vec<u64>>,
        pub submitted: Mutex<Vec<Vec<u8>>>,
    }

    impl MockLedger {
        pub fn new(records: HashMap<u64, LotteryRecord>) -> Self {
            let count = records.keys().max().copied().unwrap_or(0);
            Self {
                count,
                records,
                fail_count: false,
                fail_get: HashSet::new(),
                gas_price: 1_000,
                fail_submit: HashSet::new(),
                receipt_status: Some(true),
                fee_reads: AtomicU64::new(0),
                attempts: Mutex::new(Vec::new()),
                submitted: Mutex::new(Vec::new()),
            }
        }

        /// A record with fixed price fields; callers vary only the timing.
        pub fn record(start_time: u64, duration: u64, ended: bool) -> LotteryRecord {
            LotteryRecord {
                creator: Address([0x11; 20]),
                ticket_price: 10_000_000_000_000_000,
                prize_pool: 30_000_000_000_000_000,
                start_time,
                duration,
                ended,
                winner: Address::default(),
            }
        }

        /// The closing call carries the instance id as its only argument;
        /// pull it back out of a signed payload (RLP item 5, last 8 bytes).
        pub fn payload_id(raw: &[u8]) -> u64 {
            let rlp = rlp::Rlp::new(raw);
            let data: Vec<u8> = rlp.val_at(5).expect("signed tx has a data item");
            let arg: [u8; 8] = data[data.len() - 8..].try_into().expect("id argument");
            u64::from_be_bytes(arg)
        }
    }

    #[async_trait]
    impl Ledger for MockLedger {
        async fn count(&self) -> Result<u64, LedgerError> {
            if self.fail_count {
                return Err(LedgerError::Rpc("ledger unavailable".to_string()));
            }
            Ok(self.count)
        }

        async fn get(&self, id: u64) -> Result<LotteryRecord, LedgerError> {
            if self.fail_get.contains(&id) {
                return Err(LedgerError::Rpc("record fetch failed".to_string()));
            }
            self.records
                .get(&id)
                .cloned()
                .ok_or_else(|| LedgerError::Decode(format!("no record for id {id}")))
        }

        async fn current_network_fee(&self) -> Result<u128, LedgerError> {
            self.fee_reads.fetch_add(1, Ordering::Relaxed);
            Ok(self.gas_price)
        }

        async fn estimate_cost(&self, _from: &Address, _call_data: &[u8]) -> Result<u64, LedgerError> {
            Ok(60_000)
        }

        async fn pending_nonce(&self, _addr: &Address) -> Result<u64, LedgerError> {
            Ok(self.submitted.lock().unwrap().len() as u64)
        }

        async fn submit(&self, raw_tx: &[u8]) -> Result<String, LedgerError> {
            let id = Self::payload_id(raw_tx);
            self.attempts.lock().unwrap().push(id);
            if self.fail_submit.contains(&id) {
                return Err(LedgerError::Rpc("execution reverted".to_string()));
            }
            self.submitted.lock().unwrap().push(raw_tx.to_vec());
            Ok(format!("0xtx{id:064x}"))
        }

        async fn confirmed(&self, _tx_hash: &str) -> Result<Option<bool>, LedgerError> {
            Ok(self.receipt_status)
        }
    }
}
