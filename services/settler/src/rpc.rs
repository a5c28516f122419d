//! Ethereum JSON-RPC plumbing.
//!
//! Thin request/response structs over reqwest; every method the daemon
//! needs is a typed helper here. Quantities travel as `0x`-hex strings and
//! are parsed into native integers before anything else touches them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use lottery_abi::Address;

use crate::error::LedgerError;

/// Per-request timeout. A hung submission blocks the rest of the pass by
/// design, so the transport itself has to give up eventually.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct RpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<serde_json::Value>,
    error: Option<serde_json::Value>,
}

pub struct Rpc {
    client: reqwest::Client,
    url: String,
}

impl Rpc {
    pub fn new(url: String) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, url })
    }

    async fn call(
        &self,
        method: &'static str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, LedgerError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        let resp: RpcResponse = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = resp.error {
            return Err(LedgerError::Rpc(format!("{method}: {err}")));
        }
        resp.result
            .ok_or_else(|| LedgerError::Decode(format!("{method}: missing result")))
    }

    /// `eth_call` against `to` with the given call data, at the latest block.
    pub async fn eth_call(&self, to: &Address, data: &[u8]) -> Result<Vec<u8>, LedgerError> {
        let result = self
            .call(
                "eth_call",
                serde_json::json!([
                    { "to": to.to_string(), "data": hex_data(data) },
                    "latest"
                ]),
            )
            .await?;
        parse_hex_bytes(&result)
    }

    /// Current baseline gas price in wei.
    pub async fn gas_price(&self) -> Result<u128, LedgerError> {
        let result = self.call("eth_gasPrice", serde_json::json!([])).await?;
        parse_quantity_u128(&result)
    }

    /// Gas estimate for a prospective call from `from` to `to`.
    pub async fn estimate_gas(
        &self,
        from: &Address,
        to: &Address,
        data: &[u8],
    ) -> Result<u64, LedgerError> {
        let result = self
            .call(
                "eth_estimateGas",
                serde_json::json!([
                    { "from": from.to_string(), "to": to.to_string(), "data": hex_data(data) }
                ]),
            )
            .await?;
        parse_quantity_u64(&result)
    }

    /// Pending-tag transaction count, i.e. the next usable nonce.
    pub async fn transaction_count(&self, addr: &Address) -> Result<u64, LedgerError> {
        let result = self
            .call(
                "eth_getTransactionCount",
                serde_json::json!([addr.to_string(), "pending"]),
            )
            .await?;
        parse_quantity_u64(&result)
    }

    /// Submit a signed raw transaction; returns the transaction hash.
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<String, LedgerError> {
        let result = self
            .call("eth_sendRawTransaction", serde_json::json!([hex_data(raw)]))
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LedgerError::Decode("expected transaction hash string".to_string()))
    }

    /// Receipt status for a submitted transaction.
    ///
    /// `None` means not yet mined; `Some(true)` success; `Some(false)` revert.
    pub async fn transaction_receipt(&self, hash: &str) -> Result<Option<bool>, LedgerError> {
        let result = self
            .call("eth_getTransactionReceipt", serde_json::json!([hash]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let status = parse_quantity_u64(&result["status"])
            .map_err(|_| LedgerError::Decode("receipt missing status".to_string()))?;
        Ok(Some(status == 1))
    }

    /// EIP-155 chain id of the endpoint.
    pub async fn chain_id(&self) -> Result<u64, LedgerError> {
        let result = self.call("eth_chainId", serde_json::json!([])).await?;
        parse_quantity_u64(&result)
    }

    /// Startup connectivity probe.
    pub async fn client_version(&self) -> Result<String, LedgerError> {
        let result = self.call("web3_clientVersion", serde_json::json!([])).await?;
        Ok(result.as_str().unwrap_or("unknown").to_string())
    }
}

fn hex_data(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

fn hex_str(value: &serde_json::Value) -> Result<&str, LedgerError> {
    value
        .as_str()
        .and_then(|s| s.strip_prefix("0x"))
        .ok_or_else(|| LedgerError::Decode(format!("expected 0x-hex string, got {value}")))
}

fn parse_hex_bytes(value: &serde_json::Value) -> Result<Vec<u8>, LedgerError> {
    hex::decode(hex_str(value)?).map_err(|e| LedgerError::Decode(format!("invalid hex data: {e}")))
}

fn parse_quantity_u64(value: &serde_json::Value) -> Result<u64, LedgerError> {
    let digits = hex_str(value)?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| LedgerError::Decode(format!("invalid quantity {value}: {e}")))
}

fn parse_quantity_u128(value: &serde_json::Value) -> Result<u128, LedgerError> {
    let digits = hex_str(value)?;
    u128::from_str_radix(digits, 16)
        .map_err(|e| LedgerError::Decode(format!("invalid quantity {value}: {e}")))
}
