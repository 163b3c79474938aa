//! Contract between the client and the key-management network.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use litsec_types::{Address, AuthSig, LitsecError, ResourceAbilityRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// What the network asks the wallet to authorize.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthChallenge {
    /// The session key URI being authorized.
    pub uri: String,
    pub issued_at: String,
    pub expiration: String,
    pub resource_ability_requests: Vec<ResourceAbilityRequest>,
    /// Latest network blockhash, used as the sign-in nonce.
    pub nonce: String,
}

/// Produces a capability signature for a challenge.
///
/// Implementations must be safe to call any number of times: the network
/// client decides when a fresh capability is needed.
#[async_trait]
pub trait AuthNeeded: Send + Sync {
    async fn sign_challenge(&self, challenge: &AuthChallenge) -> Result<AuthSig, LitsecError>;
}

#[derive(Clone, Debug)]
pub struct SessionSigsParams {
    pub chain: String,
    /// ISO-8601 expiration.
    pub expiration: String,
    pub resource_ability_requests: Vec<ResourceAbilityRequest>,
}

/// A session-key signature addressed to one node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSig {
    pub sig: String,
    pub derived_via: String,
    pub signed_message: String,
    /// Session public key, hex.
    pub address: String,
    pub algo: Option<String>,
}

/// Time-boxed authorization to run actions on the network.
///
/// Held in memory only.
#[derive(Clone, Debug)]
pub struct SessionCredential {
    /// Session signatures keyed by node URL.
    pub sigs: BTreeMap<String, SessionSig>,
    pub resource_ability_requests: Vec<ResourceAbilityRequest>,
    /// Wallet that authorized the session key.
    pub authorized_by: Address,
    pub issued_at: DateTime<Utc>,
    pub expiration: DateTime<Utc>,
}

impl SessionCredential {
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiration
    }

    pub fn sig_for(&self, node: &str) -> Option<&SessionSig> {
        self.sigs.get(node)
    }
}

pub struct ExecuteJsParams<'a> {
    pub session: &'a SessionCredential,
    /// Content id of the action to run.
    pub ipfs_id: &'a str,
    pub js_params: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecuteJsResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    /// Text the action set as its response. Non-string JSON is kept as
    /// its JSON text.
    #[serde(default, deserialize_with = "response_text")]
    pub response: String,
    #[serde(default)]
    pub logs: String,
}

fn default_success() -> bool {
    true
}

fn response_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// The remote network as seen by this client.
#[async_trait]
pub trait NetworkClient: Send + Sync {
    /// Handshake with the network. Must succeed before anything else.
    async fn connect(&self) -> Result<(), LitsecError>;

    fn is_ready(&self) -> bool;

    async fn latest_blockhash(&self) -> Result<String, LitsecError>;

    /// Obtain session signatures, calling `auth` when a fresh wallet
    /// capability is required.
    async fn get_session_sigs(
        &self,
        params: &SessionSigsParams,
        auth: &dyn AuthNeeded,
    ) -> Result<SessionCredential, LitsecError>;

    async fn execute_js(&self, params: &ExecuteJsParams<'_>)
        -> Result<ExecuteJsResponse, LitsecError>;
}
