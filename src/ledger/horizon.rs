//! Horizon-style ledger API client.
//!
//! # Responsibilities
//! - Load accounts (sequence number, balances, trustlines)
//! - Submit signed envelopes and surface the ledger's diagnostics
//! - Fetch transactions and their operations for verification
//! - Faucet funding on the test network
//! - Handle timeouts and network errors gracefully

use serde::Deserialize;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

use crate::config::schema::NetworkConfig;
use crate::error::{EngineError, Result};
use crate::ledger::asset::Asset;
use crate::ledger::envelope::TransactionEnvelope;

/// An account as returned by `GET /accounts/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountRecord {
    pub account_id: String,
    /// Horizon serializes sequence numbers as strings.
    pub sequence: String,
    #[serde(default)]
    pub balances: Vec<BalanceRecord>,
}

impl AccountRecord {
    /// Sequence number as an integer.
    pub fn sequence_number(&self) -> Result<i64> {
        self.sequence
            .parse()
            .map_err(|_| EngineError::Horizon(format!("malformed sequence '{}'", self.sequence)))
    }
}

/// One balance line: the native balance or a trustline.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceRecord {
    pub balance: String,
    pub asset_type: String,
    #[serde(default)]
    pub asset_code: Option<String>,
    #[serde(default)]
    pub asset_issuer: Option<String>,
}

/// Result of relaying an envelope to the ledger.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResult {
    pub hash: String,
    pub successful: bool,
}

/// A transaction as returned by `GET /transactions/{hash}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRecord {
    pub hash: String,
    pub successful: bool,
}

/// An operation record under a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationRecord {
    #[serde(rename = "type")]
    pub op_type: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub asset_type: Option<String>,
    #[serde(default)]
    pub asset_code: Option<String>,
    #[serde(default)]
    pub asset_issuer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OperationsPage {
    #[serde(rename = "_embedded")]
    embedded: EmbeddedRecords,
}

#[derive(Debug, Deserialize)]
struct EmbeddedRecords {
    records: Vec<OperationRecord>,
}

#[derive(Debug, Deserialize)]
struct SubmissionProblem {
    #[serde(default)]
    extras: Option<SubmissionExtras>,
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmissionExtras {
    #[serde(default)]
    result_codes: Option<ResultCodes>,
}

#[derive(Debug, Deserialize)]
struct ResultCodes {
    #[serde(default)]
    transaction: Option<String>,
    #[serde(default)]
    operations: Vec<String>,
}

/// Ledger API client.
#[derive(Clone)]
pub struct HorizonClient {
    base: Url,
    friendbot: Option<Url>,
    http: reqwest::Client,
    timeout_duration: Duration,
}

impl HorizonClient {
    /// Create a client from network configuration.
    pub fn new(network: &NetworkConfig, timeout_secs: u64) -> Result<Self> {
        let base: Url = network
            .horizon_url
            .parse()
            .map_err(|e| EngineError::Horizon(format!("invalid Horizon URL '{}': {}", network.horizon_url, e)))?;
        let friendbot = match &network.friendbot_url {
            Some(u) => Some(
                u.parse()
                    .map_err(|e| EngineError::Horizon(format!("invalid faucet URL '{}': {}", u, e)))?,
            ),
            None => None,
        };
        Ok(Self {
            base,
            friendbot,
            http: reqwest::Client::new(),
            timeout_duration: Duration::from_secs(timeout_secs),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| EngineError::Horizon(format!("bad endpoint '{}': {}", path, e)))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let fut = async {
            let response = self
                .http
                .get(url.clone())
                .send()
                .await
                .map_err(|e| EngineError::Horizon(format!("request to {} failed: {}", url, e)))?;
            if !response.status().is_success() {
                return Err(EngineError::Horizon(format!(
                    "{} returned status {}",
                    url,
                    response.status()
                )));
            }
            response
                .json::<T>()
                .await
                .map_err(|e| EngineError::Horizon(format!("malformed response from {}: {}", url, e)))
        };
        match timeout(self.timeout_duration, fut).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Horizon(format!(
                "request timed out after {}s",
                self.timeout_duration.as_secs()
            ))),
        }
    }

    /// Load an account's current state: sequence number and balances.
    pub async fn load_account(&self, account_id: &str) -> Result<AccountRecord> {
        let url = self.endpoint(&format!("accounts/{}", account_id))?;
        self.get_json(url).await
    }

    /// Current sequence number of an account, loaded fresh from the ledger.
    pub async fn sequence_for(&self, account_id: &str) -> Result<i64> {
        self.load_account(account_id).await?.sequence_number()
    }

    /// True if `account_id` holds a trustline to `asset` (or the asset is
    /// native, which needs none).
    pub async fn has_trustline(&self, account_id: &str, asset: &Asset) -> Result<bool> {
        if asset.is_native() {
            return Ok(true);
        }
        let account = self.load_account(account_id).await?;
        Ok(account.balances.iter().any(|b| {
            asset.matches_record(&b.asset_type, b.asset_code.as_deref(), b.asset_issuer.as_deref())
        }))
    }

    /// Relay a signed envelope to the ledger.
    ///
    /// A ledger-side rejection becomes [`EngineError::LedgerSubmissionFailed`]
    /// carrying the ledger's result codes.
    pub async fn submit(&self, envelope: &TransactionEnvelope) -> Result<SubmitResult> {
        let url = self.endpoint("transactions")?;
        let body = [("tx", envelope.to_base64()?)];
        let fut = async {
            let response = self
                .http
                .post(url.clone())
                .form(&body)
                .send()
                .await
                .map_err(|e| EngineError::Horizon(format!("submission to {} failed: {}", url, e)))?;

            let status = response.status();
            if status.is_success() {
                return response
                    .json::<SubmitResult>()
                    .await
                    .map_err(|e| EngineError::Horizon(format!("malformed submission response: {}", e)));
            }

            let diagnostic = match response.json::<SubmissionProblem>().await {
                Ok(problem) => describe_problem(&problem, status.as_u16()),
                Err(_) => format!("status {}", status),
            };
            Err(EngineError::LedgerSubmissionFailed { diagnostic })
        };
        match timeout(self.timeout_duration, fut).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Horizon(format!(
                "submission timed out after {}s",
                self.timeout_duration.as_secs()
            ))),
        }
    }

    /// Fetch a transaction by hash. `Ok(None)` means the ledger has never
    /// seen it.
    pub async fn transaction(&self, tx_hash: &str) -> Result<Option<TransactionRecord>> {
        let url = self.endpoint(&format!("transactions/{}", tx_hash))?;
        let fut = async {
            let response = self
                .http
                .get(url.clone())
                .send()
                .await
                .map_err(|e| EngineError::Horizon(format!("request to {} failed: {}", url, e)))?;
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !response.status().is_success() {
                return Err(EngineError::Horizon(format!(
                    "{} returned status {}",
                    url,
                    response.status()
                )));
            }
            response
                .json::<TransactionRecord>()
                .await
                .map(Some)
                .map_err(|e| EngineError::Horizon(format!("malformed transaction record: {}", e)))
        };
        match timeout(self.timeout_duration, fut).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Horizon(format!(
                "request timed out after {}s",
                self.timeout_duration.as_secs()
            ))),
        }
    }

    /// Fetch the operations of a transaction.
    pub async fn operations(&self, tx_hash: &str) -> Result<Vec<OperationRecord>> {
        let url = self.endpoint(&format!("transactions/{}/operations", tx_hash))?;
        let page: OperationsPage = self.get_json(url).await?;
        Ok(page.embedded.records)
    }

    /// Ask the faucet to fund a new account. Test network only.
    pub async fn fund_account(&self, account_id: &str) -> Result<()> {
        let friendbot = self.friendbot.clone().ok_or_else(|| {
            EngineError::UnsupportedOperation("no faucet configured for this network".into())
        })?;
        let mut url = friendbot;
        url.query_pairs_mut().append_pair("addr", account_id);

        let fut = async {
            let response = self
                .http
                .get(url.clone())
                .send()
                .await
                .map_err(|e| EngineError::Horizon(format!("faucet request failed: {}", e)))?;
            if !response.status().is_success() {
                return Err(EngineError::Horizon(format!(
                    "faucet returned status {}",
                    response.status()
                )));
            }
            Ok(())
        };
        match timeout(self.timeout_duration, fut).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Horizon(format!(
                "faucet request timed out after {}s",
                self.timeout_duration.as_secs()
            ))),
        }
    }
}

fn describe_problem(problem: &SubmissionProblem, status: u16) -> String {
    if let Some(codes) = problem.extras.as_ref().and_then(|e| e.result_codes.as_ref()) {
        let tx_code = codes.transaction.as_deref().unwrap_or("unknown");
        if codes.operations.is_empty() {
            return tx_code.to_string();
        }
        return format!("{} [{}]", tx_code, codes.operations.join(", "));
    }
    problem
        .detail
        .clone()
        .unwrap_or_else(|| format!("status {}", status))
}

impl std::fmt::Debug for HorizonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HorizonClient")
            .field("base", &self.base.as_str())
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
