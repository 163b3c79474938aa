use async_trait::async_trait;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use litsec_types::{Address, AuthSig, LitsecError};
use sha3::{Digest, Keccak256};

/// A wallet that can list accounts and sign messages for them.
///
/// Mirrors the two wallet RPCs the client depends on:
/// `eth_requestAccounts` and `personal_sign`.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask for account access. The first account is the primary one.
    async fn request_accounts(&self) -> Result<Vec<Address>, LitsecError>;

    /// EIP-191 sign `message` with `address`. Returns a `0x` hex signature.
    async fn sign_message(&self, address: &Address, message: &str) -> Result<String, LitsecError>;
}

/// An in-process secp256k1 wallet.
#[derive(Clone)]
pub struct LocalWallet {
    signing_key: SigningKey,
    address: Address,
}

impl LocalWallet {
    /// Generate a new random wallet.
    pub fn random() -> Self {
        Self::from_signing_key(SigningKey::random(&mut rand::rngs::OsRng))
    }

    /// Load from a hex private key (with or without `0x`).
    pub fn from_hex(private_key: &str) -> Result<Self, LitsecError> {
        let trimmed = private_key.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits)
            .map_err(|e| LitsecError::Config(format!("invalid private key hex: {e}")))?;
        let signing_key = SigningKey::from_slice(&bytes)
            .map_err(|_| LitsecError::Config("invalid secp256k1 private key".into()))?;
        Ok(Self::from_signing_key(signing_key))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = address_from_verifying_key(signing_key.verifying_key());
        Self {
            signing_key,
            address,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Synchronous EIP-191 signature, `r || s || v` with `v = 27 + recovery id`.
    pub fn sign_personal(&self, message: &str) -> Result<String, LitsecError> {
        let prehash = eip191_hash(message);
        let (sig, recid) = self
            .signing_key
            .sign_prehash_recoverable(&prehash)
            .map_err(|_| LitsecError::InvalidSignature)?;
        let mut bytes = sig.to_bytes().to_vec();
        bytes.push(recid.to_byte() + 27);
        Ok(format!("0x{}", hex::encode(bytes)))
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, LitsecError> {
        Ok(vec![self.address])
    }

    async fn sign_message(&self, address: &Address, message: &str) -> Result<String, LitsecError> {
        if *address != self.address {
            return Err(LitsecError::UserRejected(format!(
                "account {address} is not managed by this wallet"
            )));
        }
        self.sign_personal(message)
    }
}

/// Keccak-256 of `"\x19Ethereum Signed Message:\n" || len || message`.
pub fn eip191_hash(message: &str) -> [u8; 32] {
    let bytes = message.as_bytes();
    let prefix = format!("\x19Ethereum Signed Message:\n{}", bytes.len());
    let mut hasher = Keccak256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Last 20 bytes of Keccak-256 over the uncompressed public key.
pub fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let encoded = key.to_encoded_point(false);
    let digest = Keccak256::digest(&encoded.as_bytes()[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[12..]);
    Address(out)
}

/// Recover the signing address of an EIP-191 signature.
pub fn recover_address(message: &str, signature_hex: &str) -> Result<Address, LitsecError> {
    let trimmed = signature_hex.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(digits).map_err(|_| LitsecError::InvalidSignature)?;
    if bytes.len() != 65 {
        return Err(LitsecError::InvalidSignature);
    }
    let sig = Signature::try_from(&bytes[..64]).map_err(|_| LitsecError::InvalidSignature)?;
    let recid = match bytes[64] {
        27 | 28 => bytes[64] - 27,
        0 | 1 => bytes[64],
        _ => return Err(LitsecError::InvalidSignature),
    };
    let recid = RecoveryId::from_byte(recid).ok_or(LitsecError::InvalidSignature)?;
    let key = VerifyingKey::recover_from_prehash(&eip191_hash(message), &sig, recid)
        .map_err(|_| LitsecError::InvalidSignature)?;
    Ok(address_from_verifying_key(&key))
}

/// Check that an auth signature was produced by the address it names.
pub fn verify_auth_sig(auth_sig: &AuthSig) -> Result<(), LitsecError> {
    let recovered = recover_address(&auth_sig.signed_message, &auth_sig.sig)?;
    if recovered != auth_sig.address {
        return Err(LitsecError::InvalidSignature);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known development key (account #0 of common local test chains).
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn derives_known_address() {
        let wallet = LocalWallet::from_hex(DEV_KEY).unwrap();
        assert_eq!(wallet.address().to_checksum(), DEV_ADDRESS);
    }

    #[test]
    fn rejects_bad_private_key() {
        assert!(LocalWallet::from_hex("0x1234").is_err());
        assert!(LocalWallet::from_hex("not hex").is_err());
        assert!(LocalWallet::from_hex(&format!("0x{}", "00".repeat(32))).is_err());
    }

    #[test]
    fn signature_recovers_signer() {
        let wallet = LocalWallet::random();
        let sig = wallet.sign_personal("hello lit").unwrap();
        assert!(sig.starts_with("0x"));
        assert_eq!(sig.len(), 2 + 130);
        assert_eq!(recover_address("hello lit", &sig).unwrap(), wallet.address());
    }

    #[test]
    fn recovery_detects_other_message() {
        let wallet = LocalWallet::random();
        let sig = wallet.sign_personal("original").unwrap();
        let recovered = recover_address("tampered", &sig);
        assert!(recovered.map(|a| a != wallet.address()).unwrap_or(true));
    }

    #[test]
    fn recover_rejects_malformed_signature() {
        assert_eq!(recover_address("m", "0x1234"), Err(LitsecError::InvalidSignature));
        let mut bytes = vec![1u8; 64];
        bytes.push(99);
        let sig = format!("0x{}", hex::encode(bytes));
        assert_eq!(recover_address("m", &sig), Err(LitsecError::InvalidSignature));
    }

    #[test]
    fn eip191_hash_depends_on_length_prefix() {
        assert_ne!(eip191_hash("ab"), eip191_hash("abc"));
        assert_eq!(eip191_hash("abc"), eip191_hash("abc"));
    }

    #[test]
    fn verify_auth_sig_checks_address() {
        let wallet = LocalWallet::random();
        let message = "sign in";
        let mut auth_sig = AuthSig {
            sig: wallet.sign_personal(message).unwrap(),
            derived_via: AuthSig::PERSONAL_SIGN.into(),
            signed_message: message.into(),
            address: wallet.address(),
        };
        assert!(verify_auth_sig(&auth_sig).is_ok());

        auth_sig.address = LocalWallet::random().address();
        assert_eq!(verify_auth_sig(&auth_sig), Err(LitsecError::InvalidSignature));
    }

    #[tokio::test]
    async fn provider_refuses_foreign_account() {
        let wallet = LocalWallet::random();
        let other = LocalWallet::random().address();
        assert_eq!(wallet.request_accounts().await.unwrap(), vec![wallet.address()]);
        assert!(matches!(
            wallet.sign_message(&other, "m").await,
            Err(LitsecError::UserRejected(_))
        ));
        assert!(wallet.sign_message(&wallet.address(), "m").await.is_ok());
    }
}
