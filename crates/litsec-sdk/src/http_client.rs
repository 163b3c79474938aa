use async_trait::async_trait;
use chrono::{DateTime, Utc};
use litsec_identity::{verify_auth_sig, SessionKeypair};
use litsec_types::{iso8601, parse_iso8601, AuthSig, LitsecError, ResourceAbilityRequest};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::network::{
    AuthChallenge, AuthNeeded, ExecuteJsParams, ExecuteJsResponse, NetworkClient,
    SessionCredential, SessionSig, SessionSigsParams,
};
use crate::ClientConfig;

/// Node error codes that mean the access predicate evaluated to false.
const ACCESS_DENIED_CODES: &[&str] = &[
    "NodeAccessControlConditionsReturnedNotAuthorized",
    "NodeAccessControlConditionsCheckFailed",
];

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HandshakeResponse {
    latest_blockhash: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeError {
    #[serde(default)]
    error_kind: String,
    #[serde(default)]
    error_code: String,
    #[serde(default)]
    message: String,
}

/// The message a session key signs for one node.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionMessage<'a> {
    session_key: &'a str,
    resource_ability_requests: &'a [ResourceAbilityRequest],
    capabilities: &'a [AuthSig],
    issued_at: &'a str,
    expiration: &'a str,
    node_address: &'a str,
}

/// A wallet capability kept for reuse across session requests.
#[derive(Clone)]
struct CachedCapability {
    auth_sig: AuthSig,
    expiration: DateTime<Utc>,
    requests: Vec<ResourceAbilityRequest>,
}

impl CachedCapability {
    fn covers(&self, requests: &[ResourceAbilityRequest], expiration: DateTime<Utc>) -> bool {
        self.expiration >= expiration
            && requests
                .iter()
                .all(|wanted| self.requests.iter().any(|held| held.covers(wanted)))
    }
}

#[derive(Default)]
struct ClientState {
    connected_nodes: Vec<String>,
    latest_blockhash: Option<String>,
    capability: Option<CachedCapability>,
}

/// Network client speaking JSON over HTTP to a fixed set of nodes.
///
/// Requests go to nodes one after another. A handshake or execution needs
/// `ClientConfig::threshold()` successful node responses; execution then
/// returns the most common response among them.
pub struct HttpNetworkClient {
    config: ClientConfig,
    http: reqwest::Client,
    session_key: SessionKeypair,
    state: RwLock<ClientState>,
}

impl HttpNetworkClient {
    pub fn new(config: ClientConfig) -> Result<Self, LitsecError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| LitsecError::Config(e.to_string()))?;
        Ok(Self {
            config,
            http,
            session_key: SessionKeypair::generate(),
            state: RwLock::new(ClientState::default()),
        })
    }

    fn connected_nodes(&self) -> Vec<String> {
        self.read_state().connected_nodes.clone()
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, ClientState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, ClientState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn require_nodes(&self) -> Result<Vec<String>, LitsecError> {
        let nodes = self.connected_nodes();
        if nodes.is_empty() {
            return Err(LitsecError::Network("network client is not connected".into()));
        }
        Ok(nodes)
    }

    fn node_url(node: &str, path: &str) -> String {
        format!("{}{path}", node.trim_end_matches('/'))
    }

    async fn handshake(&self, node: &str) -> Result<String, LitsecError> {
        let challenge: [u8; 32] = rand::thread_rng().gen();
        let resp = self
            .http
            .post(Self::node_url(node, "/web/handshake"))
            .json(&json!({
                "clientPublicKey": self.session_key.public_key_hex(),
                "challenge": hex::encode(challenge),
            }))
            .send()
            .await
            .map_err(|e| LitsecError::Network(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(LitsecError::Network(format!(
                "handshake with {node} failed: {}",
                resp.status()
            )));
        }
        let body: HandshakeResponse = resp
            .json()
            .await
            .map_err(|e| LitsecError::Network(format!("bad handshake from {node}: {e}")))?;
        Ok(body.latest_blockhash)
    }

    /// Handshake every node in `nodes`; returns responders and the
    /// blockhash most of them reported.
    async fn handshake_all(&self, nodes: &[String]) -> Result<(Vec<String>, String), LitsecError> {
        let mut responders = Vec::new();
        let mut blockhashes = Vec::new();
        for node in nodes {
            match self.handshake(node).await {
                Ok(blockhash) => {
                    debug!(node = %node, blockhash = %blockhash, "handshake ok");
                    responders.push(node.clone());
                    blockhashes.push(blockhash);
                }
                Err(e) => warn!(node = %node, error = %e, "handshake failed"),
            }
        }
        let threshold = self.config.threshold();
        if responders.len() < threshold {
            return Err(LitsecError::Network(format!(
                "only {} of {} nodes answered, need {threshold}",
                responders.len(),
                nodes.len()
            )));
        }
        let blockhash = most_common(blockhashes)
            .ok_or_else(|| LitsecError::Network("no blockhash reported".into()))?;
        Ok((responders, blockhash))
    }

    /// Reuse the cached capability if it still fits, otherwise ask the
    /// wallet through `auth`.
    async fn capability(
        &self,
        params: &SessionSigsParams,
        expiration: DateTime<Utc>,
        auth: &dyn AuthNeeded,
    ) -> Result<AuthSig, LitsecError> {
        let cached = self.read_state().capability.clone();
        if let Some(cached) = cached {
            if cached.covers(&params.resource_ability_requests, expiration) {
                debug!(address = %cached.auth_sig.address, "reusing cached capability");
                return Ok(cached.auth_sig);
            }
        }

        let challenge = AuthChallenge {
            uri: self.session_key.session_uri(),
            issued_at: iso8601(Utc::now()),
            expiration: params.expiration.clone(),
            resource_ability_requests: params.resource_ability_requests.clone(),
            nonce: self.latest_blockhash().await?,
        };
        let auth_sig = auth.sign_challenge(&challenge).await?;
        verify_auth_sig(&auth_sig)?;

        self.write_state().capability = Some(CachedCapability {
            auth_sig: auth_sig.clone(),
            expiration,
            requests: params.resource_ability_requests.clone(),
        });
        Ok(auth_sig)
    }

    async fn execute_on(
        &self,
        node: &str,
        sig: &SessionSig,
        params: &ExecuteJsParams<'_>,
    ) -> Result<ExecuteJsResponse, LitsecError> {
        let resp = self
            .http
            .post(Self::node_url(node, "/web/execute"))
            .json(&json!({
                "ipfsId": params.ipfs_id,
                "jsParams": params.js_params,
                "authSig": sig,
            }))
            .send()
            .await
            .map_err(|e| LitsecError::Network(e.to_string()))?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .map_err(|e| LitsecError::Network(format!("{node} returned {status}: {e}")))?;

        if status.is_success() {
            let result: ExecuteJsResponse = serde_json::from_value(body)
                .map_err(|e| LitsecError::Network(format!("bad response from {node}: {e}")))?;
            if !result.success {
                return Err(LitsecError::RemoteExecution(if result.response.is_empty() {
                    "action reported failure".into()
                } else {
                    result.response
                }));
            }
            return Ok(result);
        }

        let error: NodeError = serde_json::from_value(body)
            .map_err(|_| LitsecError::Network(format!("{node} returned {status}")))?;
        Err(classify_node_error(error))
    }
}

fn classify_node_error(error: NodeError) -> LitsecError {
    let message = if error.message.is_empty() {
        format!("{} {}", error.error_kind, error.error_code).trim().to_string()
    } else {
        error.message
    };
    if ACCESS_DENIED_CODES.contains(&error.error_code.as_str()) {
        LitsecError::AccessDenied(message)
    } else {
        LitsecError::RemoteExecution(message)
    }
}

/// The value reported most often; ties go to the first seen.
fn most_common<T: Eq + std::hash::Hash + Clone>(values: Vec<T>) -> Option<T> {
    let mut counts: HashMap<T, usize> = HashMap::new();
    for v in &values {
        *counts.entry(v.clone()).or_default() += 1;
    }
    let best = counts.values().copied().max()?;
    values.into_iter().find(|v| counts[v] == best)
}

#[async_trait]
impl NetworkClient for HttpNetworkClient {
    async fn connect(&self) -> Result<(), LitsecError> {
        if self.config.nodes.is_empty() {
            return Err(LitsecError::Config("no network nodes configured".into()));
        }
        let (responders, blockhash) = self.handshake_all(&self.config.nodes).await?;
        info!(
            network = %self.config.network,
            nodes = responders.len(),
            blockhash = %blockhash,
            "connected to network"
        );
        let mut state = self.write_state();
        state.connected_nodes = responders;
        state.latest_blockhash = Some(blockhash);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        !self.read_state().connected_nodes.is_empty()
    }

    async fn latest_blockhash(&self) -> Result<String, LitsecError> {
        let nodes = self.require_nodes()?;
        match self.handshake_all(&nodes).await {
            Ok((_, blockhash)) => {
                self.write_state().latest_blockhash = Some(blockhash.clone());
                Ok(blockhash)
            }
            Err(e) => {
                warn!(error = %e, "blockhash refresh failed");
                self.read_state().latest_blockhash.clone().ok_or(e)
            }
        }
    }

    async fn get_session_sigs(
        &self,
        params: &SessionSigsParams,
        auth: &dyn AuthNeeded,
    ) -> Result<SessionCredential, LitsecError> {
        let nodes = self.require_nodes()?;
        let expiration = parse_iso8601(&params.expiration)?;
        let capability = self.capability(params, expiration, auth).await?;

        let issued_at = Utc::now();
        let issued_at_str = iso8601(issued_at);
        let session_key = self.session_key.public_key_hex();
        let capabilities = [capability];
        let mut sigs = BTreeMap::new();
        for node in &nodes {
            let message = SessionMessage {
                session_key: &session_key,
                resource_ability_requests: &params.resource_ability_requests,
                capabilities: &capabilities,
                issued_at: &issued_at_str,
                expiration: &params.expiration,
                node_address: node,
            };
            let signed_message = serde_json::to_string(&message)
                .map_err(|e| LitsecError::Serialization(e.to_string()))?;
            let sig = self.session_key.sign(signed_message.as_bytes());
            sigs.insert(
                node.clone(),
                SessionSig {
                    sig: hex::encode(sig.to_bytes()),
                    derived_via: "litSessionSignViaNacl".into(),
                    signed_message,
                    address: session_key.clone(),
                    algo: Some("ed25519".into()),
                },
            );
        }
        debug!(session = %self.session_key.session_id(), chain = %params.chain, "session signatures issued");

        let [capability] = capabilities;
        Ok(SessionCredential {
            sigs,
            resource_ability_requests: params.resource_ability_requests.clone(),
            authorized_by: capability.address,
            issued_at,
            expiration,
        })
    }

    async fn execute_js(
        &self,
        params: &ExecuteJsParams<'_>,
    ) -> Result<ExecuteJsResponse, LitsecError> {
        if params.session.is_expired() {
            return Err(LitsecError::SessionExpired);
        }
        let nodes = self.require_nodes()?;

        let mut responses = Vec::new();
        let mut errors = Vec::new();
        for node in &nodes {
            let Some(sig) = params.session.sig_for(node) else {
                warn!(node = %node, "no session signature for node");
                continue;
            };
            match self.execute_on(node, sig, params).await {
                Ok(resp) => responses.push(resp),
                Err(e) => {
                    warn!(node = %node, error = %e, "execution failed");
                    errors.push(e);
                }
            }
        }

        let threshold = self.config.threshold();
        if responses.len() >= threshold {
            return most_common(responses)
                .ok_or_else(|| LitsecError::Network("no responses".into()));
        }
        // Prefer what the nodes said over transport noise.
        let remote = errors
            .iter()
            .position(|e| !matches!(e, LitsecError::Network(_)));
        match remote {
            Some(i) => Err(errors.swap_remove(i)),
            None => Err(errors.into_iter().next().unwrap_or_else(|| {
                LitsecError::Network(format!(
                    "{} of {} nodes answered, need {threshold}",
                    responses.len(),
                    nodes.len()
                ))
            })),
        }
    }
}
