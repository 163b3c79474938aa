use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use litsec_types::LitsecError;
use sha2::{Digest, Sha256};

/// Ephemeral Ed25519 key that signs per-node session messages.
///
/// Generated fresh for each network client and never written anywhere.
/// The wallet authorizes this key once through a capability signature;
/// afterwards only this key signs.
#[derive(Clone)]
pub struct SessionKeypair {
    signing_key: SigningKey,
}

impl SessionKeypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut csprng = rand::thread_rng();
        let signing_key = SigningKey::generate(&mut csprng);
        Self { signing_key }
    }

    /// Ed25519 public key bytes.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Public key as lowercase hex, the form the network expects.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }

    /// Short id for logs: hex SHA-256 of the public key.
    pub fn session_id(&self) -> String {
        hex::encode(Sha256::digest(self.public_key_bytes()))
    }

    /// URI the wallet authorizes in its capability signature.
    pub fn session_uri(&self) -> String {
        format!("lit:session:{}", self.public_key_hex())
    }

    /// Sign arbitrary bytes.
    pub fn sign(&self, message: &[u8]) -> ed25519_dalek::Signature {
        self.signing_key.sign(message)
    }
}

/// Verify a hex session signature given a hex public key.
pub fn verify_session_signature(
    public_key_hex: &str,
    message: &[u8],
    signature_hex: &str,
) -> Result<(), LitsecError> {
    let public_key: [u8; 32] = hex::decode(public_key_hex)
        .map_err(|_| LitsecError::InvalidSignature)?
        .try_into()
        .map_err(|_| LitsecError::InvalidSignature)?;
    let sig_bytes: [u8; 64] = hex::decode(signature_hex)
        .map_err(|_| LitsecError::InvalidSignature)?
        .try_into()
        .map_err(|_| LitsecError::InvalidSignature)?;
    let verifying_key =
        VerifyingKey::from_bytes(&public_key).map_err(|_| LitsecError::InvalidSignature)?;
    verifying_key
        .verify(message, &ed25519_dalek::Signature::from_bytes(&sig_bytes))
        .map_err(|_| LitsecError::InvalidSignature)
}
