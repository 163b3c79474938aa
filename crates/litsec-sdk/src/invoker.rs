use litsec_types::{AccessControlCondition, EncryptedPayload, LitsecError};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::network::{ExecuteJsParams, ExecuteJsResponse, NetworkClient, SessionCredential};

/// Parameters handed to the Lit Action.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsParams<'a> {
    pub access_control_conditions: &'a [AccessControlCondition],
    pub ciphertext: &'a str,
    pub data_to_encrypt_hash: &'a str,
    pub open_ai_prompt: &'a str,
}

/// Runs the decrypt-and-call action on the network.
pub struct ActionInvoker {
    network: Arc<dyn NetworkClient>,
}

impl ActionInvoker {
    pub fn new(network: Arc<dyn NetworkClient>) -> Self {
        Self { network }
    }

    /// Execute `action` with the encrypted secret and prompt.
    ///
    /// An expired credential or an incomplete payload is refused before
    /// anything is sent. Remote failures come back as one error; nothing is
    /// retried.
    pub async fn invoke(
        &self,
        credential: &SessionCredential,
        action: &str,
        predicate: &[AccessControlCondition],
        payload: &EncryptedPayload,
        prompt: &str,
    ) -> Result<ExecuteJsResponse, LitsecError> {
        if credential.is_expired() {
            return Err(LitsecError::SessionExpired);
        }
        payload.validate()?;

        let js_params = serde_json::to_value(JsParams {
            access_control_conditions: predicate,
            ciphertext: &payload.ciphertext,
            data_to_encrypt_hash: &payload.data_to_encrypt_hash,
            open_ai_prompt: prompt,
        })
        .map_err(|e| LitsecError::Serialization(e.to_string()))?;

        let result = self
            .network
            .execute_js(&ExecuteJsParams {
                session: credential,
                ipfs_id: action,
                js_params,
            })
            .await?;
        info!(action, logs = %result.logs, response = %result.response, "lit action completed");
        Ok(result)
    }
}
