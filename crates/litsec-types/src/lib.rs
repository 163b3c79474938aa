mod access;
mod payload;

pub use access::{
    AccessControlCondition, AuthSig, LitAbility, LitResource, ResourceAbilityRequest,
    ReturnValueTest,
};
pub use payload::{EncryptedPayload, INVALID_JSON_MESSAGE};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// EVM account address (20 bytes).
///
/// Displayed and serialized in EIP-55 mixed-case checksum form. Parsing
/// accepts any case.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub fn from_hex(s: &str) -> Result<Self, LitsecError> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| LitsecError::Serialization(format!("address must be 0x-prefixed: {s}")))?;
        let bytes = hex::decode(digits)
            .map_err(|e| LitsecError::Serialization(format!("invalid address {s}: {e}")))?;
        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| LitsecError::Serialization(format!("address must be 20 bytes: {s}")))?;
        Ok(Self(arr))
    }

    /// Lowercase `0x` hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// EIP-55 checksum encoding.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = Keccak256::digest(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Short form used in headers, e.g. `0x5aAe...eAed`.
    pub fn truncated(&self) -> String {
        let full = self.to_checksum();
        format!("{}...{}", &full[..6], &full[full.len() - 4..])
    }
}

impl FromStr for Address {
    type Err = LitsecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_checksum())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`.
pub fn iso8601(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an ISO-8601 / RFC 3339 timestamp into UTC.
pub fn parse_iso8601(s: &str) -> Result<DateTime<Utc>, LitsecError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LitsecError::Serialization(format!("invalid timestamp {s}: {e}")))
}

/// Errors surfaced by every litsec component.
///
/// `Display` output is what the shell shows to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LitsecError {
    #[error("Please install a wallet provider to use this application")]
    NoWallet,
    #[error("request rejected by user: {0}")]
    UserRejected(String),
    #[error("{0}")]
    MalformedPayload(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("remote execution failed: {0}")]
    RemoteExecution(String),
    #[error("session credential expired")]
    SessionExpired,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("configuration error: {0}")]
    Config(String),
}
