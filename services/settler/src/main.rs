//! Syndicate Settlement Daemon
//!
//! Watches every lottery instance on the ledger contract and closes the
//! ones whose entry window has elapsed, escalating the network fee for
//! timely inclusion.
//!
//! # Architecture
//!
//! 1. Scheduler loop drains a single trigger channel (interval timer or
//!    `POST /run`), one pass at a time
//! 2. Expiry scanner walks ids `1..=lotteryCount()` and flags expired,
//!    still-open instances
//! 3. Settlement submitter signs and sends `endLottery(id)` at 2× the
//!    baseline gas price, one attempt per instance per pass
//!
//! All state is re-derived from the ledger every pass; nothing persists
//! across restarts.
//!
//! # Running
//!
//! ```bash
//! # Point SETTLER_CONFIG at a JSON config, put the signing key in
//! # SETTLER_PRIVATE_KEY (or the configured key_path file), then:
//! RUST_LOG=info cargo run -p settler
//! ```

mod config;
mod error;
mod ledger;
mod rpc;
mod scanner;
mod scheduler;
mod server;
mod signer;
mod submitter;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

use lottery_abi::Address;

use crate::config::TriggerMode;
use crate::ledger::EthLedger;
use crate::rpc::Rpc;
use crate::scheduler::SchedulerState;
use crate::signer::TxSigner;

/// Environment variable holding the hex signing key; overrides `key_path`.
const PRIVATE_KEY_ENV: &str = "SETTLER_PRIVATE_KEY";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".parse().unwrap()),
        )
        .init();

    info!("Syndicate settler starting...");

    let config = config::load_config();
    info!(
        "RPC={}, contract={}, trigger={:?}, interval={}s, fee_multiplier={}x",
        config.rpc_url,
        config.contract_address,
        config.trigger,
        config.poll_interval_secs,
        config.fee_multiplier
    );

    let rpc = match Rpc::new(config.rpc_url.clone()) {
        Ok(rpc) => rpc,
        Err(e) => {
            error!("Failed to build RPC client: {}", e);
            std::process::exit(1);
        }
    };

    // Verify ledger connectivity; unreachable at startup is fatal.
    match rpc.client_version().await {
        Ok(version) => info!("Connected to ledger endpoint: {}", version),
        Err(e) => {
            error!("Ledger endpoint unreachable: {}", e);
            std::process::exit(1);
        }
    }
    let chain_id = match rpc.chain_id().await {
        Ok(id) => id,
        Err(e) => {
            error!("Failed to read chain id: {}", e);
            std::process::exit(1);
        }
    };
    info!("Chain id: {}", chain_id);

    let contract: Address = match config.contract_address.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid contract address: {}", e);
            std::process::exit(1);
        }
    };

    let signer = match load_signer(&config.key_path, chain_id) {
        Ok(signer) => signer,
        Err(e) => {
            error!("Failed to load signing credential: {}", e);
            std::process::exit(1);
        }
    };
    info!("Settler signer: {}", signer.address());
    info!("Dry run: {}", config.dry_run);

    let ledger = EthLedger::new(rpc, contract);
    let state = Arc::new(SchedulerState::default());
    let (triggers_tx, triggers_rx) = mpsc::channel(1);

    let _interval_task = match config.trigger {
        TriggerMode::Interval => Some(scheduler::spawn_interval_trigger(
            triggers_tx.clone(),
            Duration::from_secs(config.poll_interval_secs.max(1)),
        )),
        TriggerMode::Http => {
            if config.http_addr.is_none() {
                error!("trigger=http requires http_addr");
                std::process::exit(1);
            }
            None
        }
    };

    if let Some(bind_address) = config.http_addr.clone() {
        let app_state = server::AppState {
            scheduler: Arc::clone(&state),
            triggers: matches!(config.trigger, TriggerMode::Http).then(|| triggers_tx.clone()),
        };
        let router = server::build_router(app_state);
        tokio::spawn(async move {
            if let Err(e) = server::serve(router, &bind_address).await {
                error!("http surface failed: {}", e);
            }
        });
    }

    scheduler::run(&config, &ledger, &signer, contract, &state, triggers_rx).await;

    info!("Settler shut down cleanly");
}

/// Environment variable first, key file second. Either way the credential
/// is constructed exactly once and handed to the scheduler loop.
fn load_signer(key_path: &str, chain_id: u64) -> Result<TxSigner, String> {
    if let Ok(hex_key) = std::env::var(PRIVATE_KEY_ENV) {
        return TxSigner::from_hex_key(&hex_key, chain_id);
    }
    TxSigner::load(key_path, chain_id)
}
