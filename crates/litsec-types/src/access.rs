use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Address;

/// Condition the network evaluates before releasing a decryption key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessControlCondition {
    /// Target executable, e.g. `ipfs://Qm...` for a Lit Action.
    pub contract_address: String,
    pub standard_contract_type: String,
    pub chain: String,
    pub method: String,
    pub parameters: Vec<String>,
    pub return_value_test: ReturnValueTest,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnValueTest {
    pub comparator: String,
    pub value: String,
}

impl AccessControlCondition {
    /// A condition that runs a Lit Action and compares its return value.
    pub fn lit_action(
        action_cid: &str,
        method: &str,
        parameters: Vec<String>,
        comparator: &str,
        value: &str,
    ) -> Self {
        Self {
            contract_address: format!("ipfs://{action_cid}"),
            standard_contract_type: "LitAction".into(),
            chain: "ethereum".into(),
            method: method.into(),
            parameters,
            return_value_test: ReturnValueTest {
                comparator: comparator.into(),
                value: value.into(),
            },
        }
    }
}

/// What a session is allowed to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LitAbility {
    #[serde(rename = "lit-action-execution")]
    LitActionExecution,
    #[serde(rename = "access-control-condition-decryption")]
    AccessControlConditionDecryption,
    #[serde(rename = "access-control-condition-signing")]
    AccessControlConditionSigning,
    #[serde(rename = "pkp-signing")]
    PkpSigning,
}

impl LitAbility {
    /// ReCap namespace and ability name.
    pub fn recap(&self) -> (&'static str, &'static str) {
        match self {
            LitAbility::LitActionExecution => ("Threshold", "Execution"),
            LitAbility::AccessControlConditionDecryption => ("Threshold", "Decryption"),
            LitAbility::AccessControlConditionSigning | LitAbility::PkpSigning => {
                ("Threshold", "Signing")
            }
        }
    }
}

/// A network resource, addressed as `<prefix>://<resource>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LitResource {
    pub resource: String,
    pub resource_prefix: String,
}

impl LitResource {
    pub const LIT_ACTION_PREFIX: &'static str = "lit-litaction";

    /// A Lit Action resource; `"*"` means every action.
    pub fn lit_action(resource: &str) -> Self {
        Self {
            resource: resource.into(),
            resource_prefix: Self::LIT_ACTION_PREFIX.into(),
        }
    }

    pub fn key(&self) -> String {
        format!("{}://{}", self.resource_prefix, self.resource)
    }

    pub fn is_wildcard(&self) -> bool {
        self.resource == "*"
    }
}

impl fmt::Display for LitResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceAbilityRequest {
    pub resource: LitResource,
    pub ability: LitAbility,
}

impl ResourceAbilityRequest {
    /// Execute any Lit Action.
    pub fn execute_any_action() -> Self {
        Self {
            resource: LitResource::lit_action("*"),
            ability: LitAbility::LitActionExecution,
        }
    }

    /// Whether a grant for `self` also grants `other`.
    pub fn covers(&self, other: &ResourceAbilityRequest) -> bool {
        self.ability == other.ability
            && self.resource.resource_prefix == other.resource.resource_prefix
            && (self.resource.is_wildcard() || self.resource.resource == other.resource.resource)
    }
}

/// A wallet signature over a sign-in message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSig {
    /// `0x`-prefixed 65-byte signature.
    pub sig: String,
    pub derived_via: String,
    pub signed_message: String,
    pub address: Address,
}

impl AuthSig {
    pub const PERSONAL_SIGN: &'static str = "web3.eth.personal.sign";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn condition_serializes_with_wire_keys() {
        let condition = AccessControlCondition::lit_action(
            "QmAction",
            "checkVal",
            vec!["QmParam".into()],
            "=",
            "true",
        );
        let value = serde_json::to_value(&condition).unwrap();
        assert_eq!(
            value,
            json!({
                "contractAddress": "ipfs://QmAction",
                "standardContractType": "LitAction",
                "chain": "ethereum",
                "method": "checkVal",
                "parameters": ["QmParam"],
                "returnValueTest": { "comparator": "=", "value": "true" }
            })
        );
    }

    #[test]
    fn execute_any_action_shape() {
        let req = ResourceAbilityRequest::execute_any_action();
        assert_eq!(req.resource.key(), "lit-litaction://*");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "resource": { "resource": "*", "resourcePrefix": "lit-litaction" },
                "ability": "lit-action-execution"
            })
        );
    }

    #[test]
    fn wildcard_covers_specific_action() {
        let any = ResourceAbilityRequest::execute_any_action();
        let specific = ResourceAbilityRequest {
            resource: LitResource::lit_action("QmAction"),
            ability: LitAbility::LitActionExecution,
        };
        assert!(any.covers(&specific));
        assert!(!specific.covers(&any));

        let decrypt = ResourceAbilityRequest {
            resource: LitResource::lit_action("*"),
            ability: LitAbility::AccessControlConditionDecryption,
        };
        assert!(!any.covers(&decrypt));
    }

    #[test]
    fn recap_names() {
        assert_eq!(LitAbility::LitActionExecution.recap(), ("Threshold", "Execution"));
        assert_eq!(LitAbility::PkpSigning.recap(), ("Threshold", "Signing"));
    }
}
