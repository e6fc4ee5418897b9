use crate::error::{LotoError, Result};
use crate::ledger::LedgerSource;
use crate::types::{TransferRecord, Wei};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Upper block bound sent with every txlist query.
const END_BLOCK: u64 = 99_999_999;

#[derive(Debug, Deserialize)]
struct TxListResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawTransfer {
    #[serde(default)]
    from: String,
    #[serde(default)]
    to: String,
    value: String,
    hash: String,
}

/// Block explorer client for the `account/txlist` endpoint.
#[derive(Clone)]
pub struct EtherscanClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl EtherscanClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LotoError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query string for the whole transfer history of `address`, newest first.
    fn txlist_query(&self, address: &str) -> Vec<(&'static str, String)> {
        vec![
            ("module", "account".to_string()),
            ("action", "txlist".to_string()),
            ("address", address.to_string()),
            ("startblock", "0".to_string()),
            ("endblock", END_BLOCK.to_string()),
            ("sort", "desc".to_string()),
            ("apikey", self.api_key.clone()),
        ]
    }
}

#[async_trait]
impl LedgerSource for EtherscanClient {
    async fn fetch_transfers(&self, address: &str) -> Result<Vec<TransferRecord>> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&self.txlist_query(address))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LotoError::ledger(format!("txlist failed {} {}", status, body)));
        }

        let body = resp.text().await?;
        parse_txlist(&body)
    }
}

/// Decode a txlist body. A non-"1" status means no usable history.
pub fn parse_txlist(body: &str) -> Result<Vec<TransferRecord>> {
    let response: TxListResponse =
        serde_json::from_str(body).map_err(|e| LotoError::malformed(e.to_string()))?;

    if response.status != "1" {
        tracing::debug!(
            "txlist returned status {} ({}): {}",
            response.status,
            response.message,
            response.result
        );
        return Ok(Vec::new());
    }

    let raw: Vec<RawTransfer> =
        serde_json::from_value(response.result).map_err(|e| LotoError::malformed(e.to_string()))?;

    raw.into_iter()
        .map(|tx| {
            let value = Wei::from_wei_str(&tx.value)
                .map_err(|e| LotoError::malformed(format!("transfer {}: {}", tx.hash, e)))?;
            Ok(TransferRecord {
                from: tx.from,
                to: tx.to,
                value,
                hash: tx.hash,
            })
        })
        .collect()
}
