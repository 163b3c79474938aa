use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::LitsecError;

pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON format for encrypted data";

/// Ciphertext plus the hash of the plaintext it encrypts.
///
/// Built once per invocation from the text the user pasted; never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    #[serde(rename = "encryptedData")]
    pub ciphertext: String,
    #[serde(rename = "dataToEncryptHash")]
    pub data_to_encrypt_hash: String,
}

impl EncryptedPayload {
    pub fn new(ciphertext: impl Into<String>, data_to_encrypt_hash: impl Into<String>) -> Self {
        Self {
            ciphertext: ciphertext.into(),
            data_to_encrypt_hash: data_to_encrypt_hash.into(),
        }
    }

    /// Parse `{ "encryptedData": ..., "dataToEncryptHash": ... }`.
    ///
    /// Extra fields are ignored. Both required fields must be non-empty
    /// strings.
    pub fn parse(text: &str) -> Result<Self, LitsecError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|_| LitsecError::MalformedPayload(INVALID_JSON_MESSAGE.into()))?;
        if !value.is_object() {
            return Err(LitsecError::MalformedPayload(
                "Encrypted data must be a JSON object".into(),
            ));
        }
        let payload = Self {
            ciphertext: required_str(&value, "encryptedData")?,
            data_to_encrypt_hash: required_str(&value, "dataToEncryptHash")?,
        };
        payload.validate()?;
        Ok(payload)
    }

    /// Check that both fields carry content.
    pub fn validate(&self) -> Result<(), LitsecError> {
        if self.ciphertext.trim().is_empty() {
            return Err(missing("encryptedData"));
        }
        if self.data_to_encrypt_hash.trim().is_empty() {
            return Err(missing("dataToEncryptHash"));
        }
        Ok(())
    }
}

fn required_str(value: &Value, field: &str) -> Result<String, LitsecError> {
    value
        .get(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| missing(field))
}

fn missing(field: &str) -> LitsecError {
    LitsecError::MalformedPayload(format!("Encrypted data requires '{field}' string field"))
}
