// GraphQL indexer integration
// Client for the protocol's transfer indexer: one query correlating a
// submission transaction hash with its cross-chain packet hash

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::errors::TransferError;
use crate::metrics::{REQ_ERRORS, REQ_LATENCY};
use crate::transport::IndexerApi;

pub const DEFAULT_INDEXER_ENDPOINT: &str = "https://graphql.union.build/v1/graphql";

const PACKET_HASH_QUERY: &str = "query GetPacketHashBySubmissionTxHash($submission_tx_hash: String!) {\n  v2_transfers(args: {p_transaction_hash: $submission_tx_hash}) {\n    packet_hash\n  }\n}";
const OPERATION_NAME: &str = "GetPacketHashBySubmissionTxHash";

#[derive(Clone)]
pub struct IndexerClient {
    endpoint: Url,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct TransfersData {
    v2_transfers: Vec<PacketRow>,
}

#[derive(Debug, Deserialize)]
struct PacketRow {
    packet_hash: String,
}

impl IndexerClient {
    pub fn new(endpoint: Url) -> Result<Self, TransferError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| TransferError::Configuration(format!("build indexer client: {e}")))?;
        Ok(Self { endpoint, client })
    }

    async fn query_packet(&self, tx_hash: &str) -> Result<Vec<PacketRow>, String> {
        let _timer = REQ_LATENCY
            .with_label_values(&["graphql", OPERATION_NAME])
            .start_timer();

        let body = serde_json::json!({
            "query": PACKET_HASH_QUERY,
            "variables": { "submission_tx_hash": tx_hash },
            "operationName": OPERATION_NAME,
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Accept", "application/graphql-response+json, application/json")
            .header("Origin", "https://app.union.build")
            .header("Referer", "https://app.union.build/")
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("send indexer query: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            REQ_ERRORS
                .with_label_values(&["graphql", OPERATION_NAME])
                .inc();
            return Err(format!("indexer responded with status {status}"));
        }

        let parsed: GraphQLResponse<TransfersData> = response
            .json()
            .await
            .map_err(|e| format!("parse indexer response: {e}"))?;

        if let Some(errors) = &parsed.errors {
            REQ_ERRORS
                .with_label_values(&["graphql", OPERATION_NAME])
                .inc();
            warn!(errors = ?errors, "indexer query returned errors");
            return Err(errors
                .iter()
                .map(|e| e.message.clone())
                .collect::<Vec<_>>()
                .join(", "));
        }

        Ok(parsed.data.map(|d| d.v2_transfers).unwrap_or_default())
    }
}

#[async_trait]
impl IndexerApi for IndexerClient {
    async fn packet_hash(
        &self,
        submission_tx_hash: &str,
    ) -> Result<Option<String>, TransferError> {
        let rows = self
            .query_packet(submission_tx_hash)
            .await
            .map_err(TransferError::IndexingFailed)?;
        // empty array means the indexer has not caught up yet
        Ok(rows.into_iter().next().map(|row| row.packet_hash))
    }
}

/// Explorer page for a completed transfer.
pub fn packet_explorer_url(packet_hash: &str) -> String {
    format!("https://app.union.build/explorer/transfers/{packet_hash}")
}
