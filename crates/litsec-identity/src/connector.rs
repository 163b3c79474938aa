use litsec_types::{Address, AuthSig, LitsecError};
use std::sync::Arc;
use tracing::info;

use crate::WalletProvider;

/// A wallet bound to its primary account.
#[derive(Clone)]
pub struct ConnectedWallet {
    provider: Arc<dyn WalletProvider>,
    address: Address,
}

impl ConnectedWallet {
    pub fn new(provider: Arc<dyn WalletProvider>, address: Address) -> Self {
        Self { provider, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Ask the wallet to sign `message` with the bound account.
    pub async fn sign(&self, message: &str) -> Result<String, LitsecError> {
        self.provider.sign_message(&self.address, message).await
    }
}

impl std::fmt::Debug for ConnectedWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectedWallet")
            .field("address", &self.address)
            .finish()
    }
}

/// Obtains a signer from whatever wallet provider is available.
#[derive(Clone, Default)]
pub struct WalletConnector {
    provider: Option<Arc<dyn WalletProvider>>,
}

impl WalletConnector {
    pub fn new(provider: Option<Arc<dyn WalletProvider>>) -> Self {
        Self { provider }
    }

    /// Request account access and bind the first account.
    ///
    /// Calling again re-requests accounts. No retry on failure.
    pub async fn connect(&self) -> Result<ConnectedWallet, LitsecError> {
        let provider = self.provider.clone().ok_or(LitsecError::NoWallet)?;
        let accounts = provider.request_accounts().await?;
        let address = *accounts
            .first()
            .ok_or_else(|| LitsecError::UserRejected("no accounts were shared".into()))?;
        info!(address = %address, "wallet connected");
        Ok(ConnectedWallet::new(provider, address))
    }
}

/// Sign `to_sign` and wrap the result as a personal-sign auth signature.
pub async fn generate_auth_sig(
    wallet: &ConnectedWallet,
    to_sign: String,
) -> Result<AuthSig, LitsecError> {
    let sig = wallet.sign(&to_sign).await?;
    Ok(AuthSig {
        sig,
        derived_via: AuthSig::PERSONAL_SIGN.into(),
        signed_message: to_sign,
        address: wallet.address(),
    })
}
