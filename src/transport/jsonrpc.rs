// JSON-RPC transport layer implementation
// Thin reqwest-based Ethereum JSON-RPC client covering exactly the calls
// the transfer pipeline makes

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use reqwest::Client;
use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::warn;

use crate::errors::TransferError;
use crate::metrics::{REQ_ERRORS, REQ_LATENCY};
use crate::routes::registry::ChainTag;
use crate::transport::{ChainApi, ChainProvider, Receipt};

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(3);
const CONNECT_ATTEMPTS: u32 = 3;
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct EvmRpc {
    http: Client,
    url: String,
}

impl EvmRpc {
    pub fn new(url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            url: url.into(),
        }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, String> {
        let _timer = REQ_LATENCY
            .with_label_values(&["jsonrpc", method])
            .start_timer();
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let resp = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                REQ_ERRORS.with_label_values(&["jsonrpc", method]).inc();
                format!("{method} send: {e}")
            })?;
        if !resp.status().is_success() {
            REQ_ERRORS.with_label_values(&["jsonrpc", method]).inc();
            return Err(format!("{method} http {}", resp.status()));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| format!("{method} json parse: {e}"))?;
        if let Some(err) = body.get("error") {
            REQ_ERRORS.with_label_values(&["jsonrpc", method]).inc();
            return Err(format!("{method}: {err}"));
        }
        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn quantity(&self, method: &str, params: Value) -> Result<U256, String> {
        let result = self.request(method, params).await?;
        parse_quantity(&result).map_err(|e| format!("{method}: {e}"))
    }
}

fn parse_quantity(value: &Value) -> Result<U256, String> {
    let s = value.as_str().ok_or("expected hex quantity")?;
    U256::from_str_radix(s.trim_start_matches("0x"), 16).map_err(|e| format!("bad quantity: {e}"))
}

fn quantity_to_u64(value: U256, what: &str) -> Result<u64, String> {
    u64::try_from(value).map_err(|_| format!("{what} does not fit u64"))
}

/// The elapsed-time cutoff in the backoff policy can let a probe through
/// when failures return fast, so the attempt count is enforced explicitly:
/// the final allowed failure becomes permanent.
fn connect_retry_class(failed_attempts: u32, err: String) -> backoff::Error<String> {
    if failed_attempts >= CONNECT_ATTEMPTS {
        backoff::Error::permanent(err)
    } else {
        backoff::Error::transient(err)
    }
}

#[async_trait]
impl ChainApi for EvmRpc {
    async fn connect_check(&self) -> Result<(), TransferError> {
        // 3 probes, fixed 3s apart; ExponentialBackoff degenerates to a
        // constant schedule with multiplier 1 and no jitter, and the probe
        // count is bounded by connect_retry_class rather than elapsed time.
        let policy = ExponentialBackoff {
            initial_interval: CONNECT_RETRY_DELAY,
            randomization_factor: 0.0,
            multiplier: 1.0,
            max_interval: CONNECT_RETRY_DELAY,
            max_elapsed_time: None,
            ..Default::default()
        };
        let failures = AtomicU32::new(0);
        retry(policy, || async {
            match self.request("eth_blockNumber", json!([])).await {
                Ok(_) => Ok(()),
                Err(e) => {
                    let failed = failures.fetch_add(1, Ordering::SeqCst) + 1;
                    Err(connect_retry_class(failed, e))
                }
            }
        })
        .await
        .map_err(|e| TransferError::RpcUnavailable(format!("{}: {e}", self.url)))
    }

    async fn balance(&self, address: Address) -> Result<U256, TransferError> {
        self.quantity("eth_getBalance", json!([address, "latest"]))
            .await
            .map_err(TransferError::RpcUnavailable)
    }

    async fn chain_id(&self) -> Result<u64, TransferError> {
        let id = self
            .quantity("eth_chainId", json!([]))
            .await
            .and_then(|v| quantity_to_u64(v, "chain id"))
            .map_err(TransferError::BroadcastFailed)?;
        Ok(id)
    }

    async fn base_fee_per_gas(&self) -> Result<u128, TransferError> {
        let block = self
            .request("eth_getBlockByNumber", json!(["latest", false]))
            .await
            .map_err(TransferError::BroadcastFailed)?;
        match block.get("baseFeePerGas") {
            Some(Value::Null) | None => Ok(0),
            Some(v) => {
                let fee = parse_quantity(v).map_err(TransferError::BroadcastFailed)?;
                u128::try_from(fee)
                    .map_err(|_| TransferError::BroadcastFailed("base fee overflow".into()))
            }
        }
    }

    async fn estimate_gas(
        &self,
        from: Address,
        to: Address,
        value: U256,
        data: &Bytes,
    ) -> Result<u64, TransferError> {
        let call = json!([{
            "from": from,
            "to": to,
            "value": format!("0x{value:x}"),
            "data": format!("0x{}", hex::encode(data)),
        }]);
        self.quantity("eth_estimateGas", call)
            .await
            .and_then(|v| quantity_to_u64(v, "gas estimate"))
            .map_err(TransferError::BroadcastFailed)
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64, TransferError> {
        self.quantity("eth_getTransactionCount", json!([address, "pending"]))
            .await
            .and_then(|v| quantity_to_u64(v, "nonce"))
            .map_err(TransferError::BroadcastFailed)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, TransferError> {
        let result = self
            .request(
                "eth_sendRawTransaction",
                json!([format!("0x{}", hex::encode(raw))]),
            )
            .await
            .map_err(TransferError::BroadcastFailed)?;
        result
            .as_str()
            .and_then(|s| s.parse::<B256>().ok())
            .ok_or_else(|| TransferError::BroadcastFailed("malformed tx hash in response".into()))
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: B256,
        timeout: Duration,
    ) -> Result<Receipt, TransferError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self
                .request("eth_getTransactionReceipt", json!([tx_hash]))
                .await
            {
                Ok(Value::Null) => {}
                Ok(receipt) => {
                    let status_ok = receipt
                        .get("status")
                        .and_then(Value::as_str)
                        .map(|s| s == "0x1")
                        .unwrap_or(false);
                    let block_number = receipt
                        .get("blockNumber")
                        .map(parse_quantity)
                        .transpose()
                        .ok()
                        .flatten()
                        .and_then(|v| u64::try_from(v).ok())
                        .unwrap_or_default();
                    return Ok(Receipt {
                        block_number,
                        status_ok,
                    });
                }
                // transient: keep polling until the deadline
                Err(e) => warn!(endpoint = %self.url, error = %e, "receipt poll failed"),
            }
            if Instant::now() + RECEIPT_POLL_INTERVAL > deadline {
                return Err(TransferError::ConfirmationTimeout(timeout.as_secs()));
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}

/// Chain-client factory backed by the per-chain RPC endpoints, with
/// config-level overrides on top of the registry defaults.
pub struct RpcProvider {
    overrides: HashMap<ChainTag, String>,
}

impl RpcProvider {
    pub fn new(overrides: HashMap<ChainTag, String>) -> Self {
        Self { overrides }
    }

    fn url_for(&self, tag: ChainTag) -> String {
        self.overrides
            .get(&tag)
            .cloned()
            .unwrap_or_else(|| tag.default_rpc_url().to_string())
    }
}

impl ChainProvider for RpcProvider {
    fn chain(&self, tag: ChainTag) -> Arc<dyn ChainApi> {
        Arc::new(EvmRpc::new(self.url_for(tag)))
    }
}
