// Transfer execution pipeline
// Sequences one transfer attempt end to end: balance check, instruction
// build, sign/broadcast, receipt confirmation, indexer registration; plus
// the per-route and all-routes driver loops

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alloy_consensus::TxEip1559;
use alloy_primitives::{TxKind, B256, U256};
use rand::Rng;
use tracing::{error, info, warn};

use crate::errors::TransferError;
use crate::routes::codec::{build_instruction, router_address, send_calldata, TransferRequest};
use crate::routes::registry::{self, ChainTag, Route};
use crate::signing::{derive_salt, TxSigner};
use crate::transport::graphql::packet_explorer_url;
use crate::transport::{ChainProvider, IndexerApi};

const GWEI: f64 = 1e9;
const TIMEOUT_WINDOW_NS: u64 = 86_400_000_000_000; // 24h
const GAS_BUFFER_NUM: u64 = 12;
const GAS_BUFFER_DEN: u64 = 10;

/// Fixed counts and delays for the network-dependent steps. Defaults are
/// the production values; tests shrink them.
#[derive(Debug, Clone)]
pub struct PipelineTiming {
    pub receipt_timeout: Duration,
    pub settle_delay: Duration,
    pub indexer_poll_interval: Duration,
    pub indexer_attempts: u32,
    /// Inclusive bounds of the randomized inter-attempt delay in seconds.
    pub min_delay_secs: u64,
    pub max_delay_secs: u64,
}

impl Default for PipelineTiming {
    fn default() -> Self {
        Self {
            receipt_timeout: Duration::from_secs(600),
            settle_delay: Duration::from_secs(5),
            indexer_poll_interval: Duration::from_secs(5),
            indexer_attempts: 30,
            min_delay_secs: 1,
            max_delay_secs: 1,
        }
    }
}

/// Result of one completed attempt. `packet_hash` stays empty when the
/// indexer never caught up; the on-chain transfer itself succeeded.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub tx_hash: B256,
    pub block_number: u64,
    pub packet_hash: Option<String>,
}

/// Per-route tally for a driver run.
#[derive(Debug, Clone)]
pub struct RouteSummary {
    pub route_id: u8,
    pub pair: &'static str,
    pub requested: u32,
    pub completed: u32,
    /// Set when the remaining attempts were abandoned (insufficient funds
    /// or shutdown), as opposed to individually failed.
    pub aborted: bool,
}

pub struct Pipeline {
    provider: Arc<dyn ChainProvider>,
    indexer: Arc<dyn IndexerApi>,
    signer: TxSigner,
    xion_account: String,
    babylon_account: String,
    amount_overrides: HashMap<ChainTag, f64>,
    timing: PipelineTiming,
    shutdown: Arc<AtomicBool>,
}

impl Pipeline {
    pub fn new(
        provider: Arc<dyn ChainProvider>,
        indexer: Arc<dyn IndexerApi>,
        signer: TxSigner,
        xion_account: String,
        babylon_account: String,
    ) -> Self {
        Self {
            provider,
            indexer,
            signer,
            xion_account,
            babylon_account,
            amount_overrides: HashMap::new(),
            timing: PipelineTiming::default(),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_amount_overrides(mut self, overrides: HashMap<ChainTag, f64>) -> Self {
        self.amount_overrides = overrides;
        self
    }

    pub fn with_timing(mut self, timing: PipelineTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Flag checked between attempts and routes; set it from a signal
    /// handler for a clean exit with no transfer left half-done.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    fn shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// One full attempt: Idle → BalanceChecked → InstructionBuilt →
    /// Broadcast → Confirmed → Indexed.
    pub async fn run_attempt(&self, route: &Route) -> Result<TransferOutcome, TransferError> {
        let sender = self.signer.address();
        let chain = self.provider.chain(route.source);
        chain.connect_check().await?;

        let amount = route.amount_base_units(self.amount_overrides.get(&route.source).copied())?;
        let ticker = route.source.ticker();

        let balance = chain.balance(sender).await?;
        info!(
            pair = route.pair,
            balance = %display_units(balance),
            amount = %display_units(amount),
            ticker = ticker,
            "balance checked"
        );
        // strict headroom rule: an exact-balance transfer leaves nothing
        // for gas and is rejected too
        if balance <= amount {
            return Err(TransferError::InsufficientFunds {
                ticker,
                balance: balance.to_string(),
                amount: amount.to_string(),
            });
        }

        let request = TransferRequest {
            route,
            sender,
            xion_account: &self.xion_account,
            babylon_account: &self.babylon_account,
            amount_base_units: amount,
        };
        let instruction = build_instruction(&request)?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| TransferError::BroadcastFailed(format!("clock: {e}")))?;
        let salt = derive_salt(sender, now.as_secs());
        let timeout_timestamp = now.as_nanos() as u64 + TIMEOUT_WINDOW_NS;
        let data = send_calldata(route.channel_id, 0, timeout_timestamp, salt, &instruction);

        let estimated = chain
            .estimate_gas(sender, router_address(), amount, &data)
            .await?;
        let gas_limit = estimated * GAS_BUFFER_NUM / GAS_BUFFER_DEN;
        let base_fee = chain.base_fee_per_gas().await?;
        let priority_fee = (route.fee_gwei * GWEI).round() as u128;
        let max_fee = base_fee + priority_fee;
        let chain_id = chain.chain_id().await?;
        // pending nonce fetched immediately before signing keeps ordering
        // race-free while attempts stay sequential
        let nonce = chain.pending_nonce(sender).await?;

        let tx = TxEip1559 {
            chain_id,
            nonce,
            gas_limit,
            max_fee_per_gas: max_fee,
            max_priority_fee_per_gas: priority_fee,
            to: TxKind::Call(router_address()),
            value: amount,
            access_list: Default::default(),
            input: data,
        };
        let raw = self.signer.sign_eip1559(tx)?;
        let tx_hash = chain.send_raw_transaction(&raw).await?;
        info!(
            tx = %tx_hash,
            explorer = %route.explorer_tx_url(&tx_hash.to_string()),
            "transaction broadcast"
        );

        let receipt = chain
            .wait_for_receipt(tx_hash, self.timing.receipt_timeout)
            .await?;
        if !receipt.status_ok {
            return Err(TransferError::TransactionReverted(tx_hash.to_string()));
        }
        info!(block = receipt.block_number, "transfer confirmed");

        // the indexer lags the chain; give it a moment before polling
        tokio::time::sleep(self.timing.settle_delay).await;
        let packet_hash = self.poll_indexer(&tx_hash.to_string()).await;
        match &packet_hash {
            Some(packet) => info!(
                packet = %packet,
                explorer = %packet_explorer_url(packet),
                "transfer indexed"
            ),
            None => warn!(
                tx = %tx_hash,
                "{}",
                TransferError::IndexingFailed("indexer never returned a packet".into())
            ),
        }

        Ok(TransferOutcome {
            tx_hash,
            block_number: receipt.block_number,
            packet_hash,
        })
    }

    /// Bounded indexer polling. Exhaustion is reported but never rolls the
    /// transfer back.
    async fn poll_indexer(&self, tx_hash: &str) -> Option<String> {
        for attempt in 1..=self.timing.indexer_attempts {
            match self.indexer.packet_hash(tx_hash).await {
                Ok(Some(packet)) => return Some(packet),
                Ok(None) => {}
                Err(e) => warn!(attempt, error = %e, "indexer query failed"),
            }
            if attempt < self.timing.indexer_attempts {
                tokio::time::sleep(self.timing.indexer_poll_interval).await;
            }
        }
        None
    }

    /// Repeat the attempt `count` times on one route, with a randomized
    /// delay between attempts. Insufficient funds abort the remainder.
    pub async fn run_route(&self, route: &Route, count: u32) -> RouteSummary {
        info!(pair = route.pair, count, "starting route");
        let mut summary = RouteSummary {
            route_id: route.id,
            pair: route.pair,
            requested: count,
            completed: 0,
            aborted: false,
        };

        for attempt in 1..=count {
            if self.shutting_down() {
                info!(pair = route.pair, "shutdown requested, leaving route");
                summary.aborted = true;
                break;
            }
            info!(pair = route.pair, "transfer {attempt} of {count}");
            match self.run_attempt(route).await {
                Ok(outcome) => {
                    summary.completed += 1;
                    info!(
                        tx = %outcome.tx_hash,
                        block = outcome.block_number,
                        indexed = outcome.packet_hash.is_some(),
                        "transfer complete"
                    );
                }
                Err(e) if e.aborts_route() => {
                    warn!(pair = route.pair, error = %e, "aborting remaining attempts");
                    summary.aborted = true;
                    break;
                }
                Err(e) => {
                    error!(pair = route.pair, error = %e, "transfer attempt failed");
                }
            }
            if attempt < count {
                let wait = {
                    let mut rng = rand::thread_rng();
                    rng.gen_range(self.timing.min_delay_secs..=self.timing.max_delay_secs)
                };
                info!(seconds = wait, "waiting before next transfer");
                tokio::time::sleep(Duration::from_secs(wait)).await;
            }
        }
        summary
    }

    /// Composite mode: every registry route in declared order. A route
    /// aborting does not stop the run.
    pub async fn run_all(&self, count: u32) -> Vec<RouteSummary> {
        let mut summaries = Vec::with_capacity(registry::all().len());
        for route in registry::all() {
            if self.shutting_down() {
                break;
            }
            summaries.push(self.run_route(route, count).await);
        }
        summaries
    }
}

fn display_units(wei: U256) -> String {
    match u128::try_from(wei) {
        Ok(v) => format!("{}", v as f64 / 1e18),
        Err(_) => wei.to_string(),
    }
}
