//! Shared utilities for integration testing: a programmable mock ledger
//! and scripted wallet transports.

use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use funding_engine::config::schema::{EngineConfig, NetworkConfig, NetworkKind};

pub const TEST_PASSPHRASE: &str = "Test SDF Network ; September 2015";

/// In-memory Horizon double. Seed accounts/transactions/operations, then
/// point a `HorizonClient` at [`start`](MockLedger::start)'s address.
#[derive(Default)]
pub struct MockLedger {
    accounts: DashMap<String, serde_json::Value>,
    transactions: DashMap<String, serde_json::Value>,
    operations: DashMap<String, serde_json::Value>,
    hits: DashMap<String, u32>,
    submissions: AtomicU32,
}

impl MockLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed an account with a sequence number and balance lines.
    pub fn put_account(&self, account_id: &str, sequence: i64, balances: serde_json::Value) {
        self.accounts.insert(
            account_id.to_string(),
            serde_json::json!({
                "account_id": account_id,
                "sequence": sequence.to_string(),
                "balances": balances,
            }),
        );
    }

    /// Seed a settled transaction and its operation records.
    pub fn put_transaction(&self, tx_hash: &str, successful: bool, operations: serde_json::Value) {
        self.transactions.insert(
            tx_hash.to_string(),
            serde_json::json!({ "hash": tx_hash, "successful": successful }),
        );
        self.operations.insert(
            tx_hash.to_string(),
            serde_json::json!({ "_embedded": { "records": operations } }),
        );
    }

    /// How many requests hit paths starting with `prefix`.
    pub fn hits(&self, prefix: &str) -> u32 {
        self.hits
            .iter()
            .filter(|r| r.key().starts_with(prefix))
            .map(|r| *r.value())
            .sum()
    }

    /// How many envelopes were submitted.
    pub fn submissions(&self) -> u32 {
        self.submissions.load(Ordering::SeqCst)
    }

    fn respond(&self, method: &str, path: &str) -> (u16, String) {
        let path = path.split('?').next().unwrap_or(path);
        *self.hits.entry(path.to_string()).or_insert(0) += 1;

        if method == "POST" && path == "/transactions" {
            let n = self.submissions.fetch_add(1, Ordering::SeqCst);
            let body = serde_json::json!({
                "hash": format!("{:064x}", 0xfeed_0000_u64 + n as u64),
                "successful": true,
            });
            return (200, body.to_string());
        }

        if let Some(account_id) = path.strip_prefix("/accounts/") {
            return match self.accounts.get(account_id) {
                Some(account) => (200, account.value().to_string()),
                None => (404, r#"{"status":404,"title":"Resource Missing"}"#.to_string()),
            };
        }

        if let Some(rest) = path.strip_prefix("/transactions/") {
            if let Some(tx_hash) = rest.strip_suffix("/operations") {
                return match self.operations.get(tx_hash) {
                    Some(ops) => (200, ops.value().to_string()),
                    None => (404, r#"{"status":404}"#.to_string()),
                };
            }
            return match self.transactions.get(rest) {
                Some(tx) => (200, tx.value().to_string()),
                None => (404, r#"{"status":404}"#.to_string()),
            };
        }

        if path == "/friendbot" {
            return (200, r#"{"successful":true}"#.to_string());
        }

        (404, r#"{"status":404}"#.to_string())
    }

    /// Bind an ephemeral port and serve until the test process exits.
    pub async fn start(self: Arc<Self>) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let ledger = self;

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((mut socket, _)) => {
                        let ledger = ledger.clone();
                        tokio::spawn(async move {
                            let mut buf = vec![0u8; 64 * 1024];
                            let mut read = 0;
                            // Read headers, then drain the body per
                            // Content-Length so the client never sees a
                            // reset mid-request.
                            let mut body_end = None;
                            loop {
                                if let Some(end) = body_end {
                                    if read >= end {
                                        break;
                                    }
                                } else if let Some(pos) =
                                    buf[..read].windows(4).position(|w| w == b"\r\n\r\n")
                                {
                                    let head = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
                                    let content_length = head
                                        .lines()
                                        .find_map(|l| l.strip_prefix("content-length:"))
                                        .and_then(|v| v.trim().parse::<usize>().ok())
                                        .unwrap_or(0);
                                    body_end = Some(pos + 4 + content_length);
                                    continue;
                                }
                                match socket.read(&mut buf[read..]).await {
                                    Ok(0) => break,
                                    Ok(n) => read += n,
                                    Err(_) => return,
                                }
                            }
                            let request = String::from_utf8_lossy(&buf[..read]);
                            let mut parts = request.split_whitespace();
                            let method = parts.next().unwrap_or("").to_string();
                            let path = parts.next().unwrap_or("").to_string();

                            let (status, body) = ledger.respond(&method, &path);
                            let status_text = match status {
                                200 => "200 OK",
                                400 => "400 Bad Request",
                                404 => "404 Not Found",
                                _ => "500 Internal Server Error",
                            };
                            let response = format!(
                                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                                status_text,
                                body.len(),
                                body
                            );
                            let _ = socket.write_all(response.as_bytes()).await;
                            let _ = socket.shutdown().await;
                        });
                    }
                    Err(_) => break,
                }
            }
        });

        addr
    }
}

/// Engine config pointed at a mock ledger.
pub fn engine_config(ledger_addr: SocketAddr) -> EngineConfig {
    let base = format!("http://{}", ledger_addr);
    let mut config = EngineConfig::default();
    config.network = NetworkConfig {
        kind: NetworkKind::Testnet,
        horizon_url: format!("{}/", base),
        passphrase: TEST_PASSPHRASE.to_string(),
        friendbot_url: Some(format!("{}/friendbot", base)),
    };
    config.custody.master_key_hex = Some("42".repeat(32));
    // Keep bounded retries fast in tests
    config.retries.trustline_interval_ms = 10;
    config.retries.detect_interval_ms = 1;
    config.timeouts.horizon_secs = 5;
    config
}

/// A native-balance line for `put_account`.
pub fn native_balance(amount: &str) -> serde_json::Value {
    serde_json::json!({ "balance": amount, "asset_type": "native" })
}

/// A trustline balance line for `put_account`.
pub fn trustline(code: &str, issuer: &str) -> serde_json::Value {
    serde_json::json!({
        "balance": "0.0000000",
        "asset_type": if code.len() <= 4 { "credit_alphanum4" } else { "credit_alphanum12" },
        "asset_code": code,
        "asset_issuer": issuer,
    })
}

/// A settled native payment operation record.
pub fn payment_op(to: &str, amount: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "payment",
        "to": to,
        "amount": amount,
        "asset_type": "native",
    })
}
