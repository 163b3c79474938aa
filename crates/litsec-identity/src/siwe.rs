//! Sign-In with Ethereum (EIP-4361) messages carrying a ReCap (EIP-5573)
//! capability resource.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use litsec_types::{Address, LitsecError, ResourceAbilityRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

const RECAP_PREFIX: &str = "urn:recap:";

/// An EIP-4361 message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiweMessage {
    pub domain: String,
    pub address: Address,
    pub statement: String,
    pub uri: String,
    pub version: String,
    pub chain_id: u64,
    pub nonce: String,
    pub issued_at: String,
    pub expiration_time: Option<String>,
    pub resources: Vec<String>,
}

impl SiweMessage {
    /// A message authorizing `uri` to exercise `requests` until `expiration`.
    ///
    /// The ReCap statement is appended to `statement` and the encoded
    /// capability becomes the last resource line.
    #[allow(clippy::too_many_arguments)]
    pub fn with_capabilities(
        domain: &str,
        address: Address,
        statement: &str,
        uri: &str,
        nonce: &str,
        issued_at: &str,
        expiration: &str,
        requests: &[ResourceAbilityRequest],
    ) -> Result<Self, LitsecError> {
        let recap = Recap::from_requests(requests);
        let statement = if statement.is_empty() {
            recap.statement()
        } else {
            format!("{statement} {}", recap.statement())
        };
        Ok(Self {
            domain: domain.into(),
            address,
            statement,
            uri: uri.into(),
            version: "1".into(),
            chain_id: 1,
            nonce: nonce.into(),
            issued_at: issued_at.into(),
            expiration_time: Some(expiration.into()),
            resources: vec![recap.to_resource_uri()?],
        })
    }

    /// The exact text the wallet signs.
    pub fn to_message(&self) -> String {
        let mut out = format!(
            "{} wants you to sign in with your Ethereum account:\n{}\n\n",
            self.domain,
            self.address.to_checksum()
        );
        if !self.statement.is_empty() {
            out.push_str(&self.statement);
            out.push_str("\n\n");
        }
        out.push_str(&format!("URI: {}\n", self.uri));
        out.push_str(&format!("Version: {}\n", self.version));
        out.push_str(&format!("Chain ID: {}\n", self.chain_id));
        out.push_str(&format!("Nonce: {}\n", self.nonce));
        out.push_str(&format!("Issued At: {}", self.issued_at));
        if let Some(expiration) = &self.expiration_time {
            out.push_str(&format!("\nExpiration Time: {expiration}"));
        }
        if !self.resources.is_empty() {
            out.push_str("\nResources:");
            for resource in &self.resources {
                out.push_str(&format!("\n- {resource}"));
            }
        }
        out
    }
}

/// ReCap capability object: `att` maps resource keys to
/// `"Namespace/Ability"` entries.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Recap {
    pub att: BTreeMap<String, BTreeMap<String, Vec<Value>>>,
    pub prf: Vec<String>,
}

impl Recap {
    pub fn from_requests(requests: &[ResourceAbilityRequest]) -> Self {
        let mut recap = Recap::default();
        for request in requests {
            let (namespace, name) = request.ability.recap();
            recap
                .att
                .entry(request.resource.key())
                .or_default()
                .insert(format!("{namespace}/{name}"), vec![Value::Object(Default::default())]);
        }
        recap
    }

    /// `urn:recap:` + base64url(JSON) without padding.
    pub fn to_resource_uri(&self) -> Result<String, LitsecError> {
        let json =
            serde_json::to_vec(self).map_err(|e| LitsecError::Serialization(e.to_string()))?;
        Ok(format!("{RECAP_PREFIX}{}", URL_SAFE_NO_PAD.encode(json)))
    }

    /// Human-readable statement, e.g.
    /// `(1) 'Threshold': 'Execution' for 'lit-litaction://*'.`
    pub fn statement(&self) -> String {
        let mut clauses = Vec::new();
        for (resource, abilities) in &self.att {
            for ability in abilities.keys() {
                let (namespace, name) = ability.split_once('/').unwrap_or(("", ability));
                clauses.push(format!(
                    "({}) '{namespace}': '{name}' for '{resource}'.",
                    clauses.len() + 1
                ));
            }
        }
        format!(
            "I further authorize the stated URI to perform the following actions on my behalf: {}",
            clauses.join(" ")
        )
    }
}
