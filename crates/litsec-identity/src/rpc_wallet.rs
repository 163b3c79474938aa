use async_trait::async_trait;
use litsec_types::{Address, LitsecError};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::WalletProvider;

/// EIP-1193 code for "user rejected the request".
const USER_REJECTED: i64 = 4001;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// A wallet reached over JSON-RPC 2.0 HTTP (a local signer daemon or a
/// browser-wallet bridge).
pub struct JsonRpcWallet {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcWallet {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, LitsecError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };
        debug!(url = %self.url, method, "wallet rpc call");

        let resp = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LitsecError::Network(format!("wallet unreachable: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LitsecError::Network(format!("wallet returned HTTP {status}")));
        }
        let body: JsonRpcResponse<T> = resp.json().await.map_err(|e| {
            LitsecError::Network(format!("wallet sent an unreadable reply (HTTP {status}): {e}"))
        })?;

        if let Some(err) = body.error {
            return Err(match err.code {
                USER_REJECTED => LitsecError::UserRejected(err.message),
                _ => LitsecError::Network(format!("wallet error {}: {}", err.code, err.message)),
            });
        }
        body.result
            .ok_or_else(|| LitsecError::Serialization(format!("{method}: missing result")))
    }
}

#[async_trait]
impl WalletProvider for JsonRpcWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, LitsecError> {
        let accounts: Vec<String> = self.call("eth_requestAccounts", json!([])).await?;
        accounts.iter().map(|a| Address::from_hex(a)).collect()
    }

    async fn sign_message(&self, address: &Address, message: &str) -> Result<String, LitsecError> {
        let data = format!("0x{}", hex::encode(message.as_bytes()));
        self.call("personal_sign", json!([data, address.to_checksum()]))
            .await
    }
}
