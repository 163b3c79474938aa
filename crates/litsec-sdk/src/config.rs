use litsec_types::{AccessControlCondition, LitsecError};
use serde::{Deserialize, Serialize};

/// Content id of the Lit Action that decrypts the secret and calls the AI service.
pub const DEFAULT_ACTION_IPFS_ID: &str = "QmQ5wSTVTrQEqpLyAuPE67KRJCSq4oLty2ahTQrRGXVUZf";
/// Content id of the Lit Action that gates decryption.
pub const DEFAULT_CONDITION_IPFS_ID: &str = "QmVhccY3ucrAsNx1LfGSMrYrBukDGKHgLtuCqygUzfTdTk";

/// Longest session credential lifetime accepted, one day.
pub const MAX_SESSION_TTL_SECS: i64 = 86_400;

/// Client configuration.
///
/// Everything is per deployment; the defaults reproduce the demo
/// deployment. Node URLs have no default and must be configured.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Network name, used in logs only.
    pub network: String,
    /// Base URLs of the network nodes.
    pub nodes: Vec<String>,
    /// Nodes that must answer a handshake or an execution. Defaults to
    /// two thirds of `nodes`, rounded up.
    pub min_node_count: Option<usize>,
    /// Chain the session signatures are requested for.
    pub chain: String,
    /// Content id of the Lit Action to execute.
    pub action_ipfs_id: String,
    /// Access predicate sent with every invocation.
    pub access_control_conditions: Vec<AccessControlCondition>,
    /// Session credential lifetime in seconds.
    pub session_ttl_secs: i64,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Domain line of the sign-in message.
    pub siwe_domain: String,
    /// Statement line of the sign-in message, before the capability text.
    pub siwe_statement: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            network: "datil-dev".to_string(),
            nodes: Vec::new(),
            min_node_count: None,
            chain: "baseSepolia".to_string(),
            action_ipfs_id: DEFAULT_ACTION_IPFS_ID.to_string(),
            access_control_conditions: vec![AccessControlCondition::lit_action(
                DEFAULT_CONDITION_IPFS_ID,
                "checkVal",
                vec![DEFAULT_ACTION_IPFS_ID.to_string()],
                "=",
                "true",
            )],
            session_ttl_secs: 600,
            request_timeout_secs: 30,
            siwe_domain: "localhost".to_string(),
            siwe_statement: "Authorize a Lit session for this client.".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, LitsecError> {
        let config: Self = toml::from_str(text).map_err(|e| LitsecError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LitsecError> {
        if self.session_ttl_secs <= 0 || self.session_ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(LitsecError::Config(format!(
                "session_ttl_secs must be between 1 and {MAX_SESSION_TTL_SECS}"
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(LitsecError::Config("request_timeout_secs must be positive".into()));
        }
        if self.action_ipfs_id.trim().is_empty() {
            return Err(LitsecError::Config("action_ipfs_id is empty".into()));
        }
        if self.access_control_conditions.is_empty() {
            return Err(LitsecError::Config(
                "at least one access control condition is required".into(),
            ));
        }
        if let Some(min) = self.min_node_count {
            if min == 0 || min > self.nodes.len() {
                return Err(LitsecError::Config(format!(
                    "min_node_count {min} must be between 1 and the {} configured nodes",
                    self.nodes.len()
                )));
            }
        }
        Ok(())
    }

    /// Number of node answers required.
    pub fn threshold(&self) -> usize {
        self.min_node_count
            .unwrap_or_else(|| (self.nodes.len() * 2).div_ceil(3))
            .max(1)
    }

    pub fn session_ttl(&self) -> Result<chrono::Duration, LitsecError> {
        chrono::Duration::try_seconds(self.session_ttl_secs).ok_or_else(|| {
            LitsecError::Config(format!("session_ttl_secs {} is out of range", self.session_ttl_secs))
        })
    }
}
