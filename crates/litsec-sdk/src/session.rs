use async_trait::async_trait;
use chrono::Utc;
use litsec_identity::{generate_auth_sig, ConnectedWallet, SiweMessage};
use litsec_types::{iso8601, AuthSig, LitsecError, ResourceAbilityRequest};
use std::sync::Arc;
use tracing::{debug, info};

use crate::network::{AuthChallenge, AuthNeeded, NetworkClient, SessionCredential, SessionSigsParams};
use crate::ClientConfig;

/// Signs network challenges with a connected wallet.
///
/// The output depends only on the challenge and the wallet, so the network
/// client may call it as often as it likes.
pub struct WalletAuthCallback {
    wallet: ConnectedWallet,
    domain: String,
    statement: String,
}

impl WalletAuthCallback {
    pub fn new(wallet: ConnectedWallet, domain: impl Into<String>, statement: impl Into<String>) -> Self {
        Self {
            wallet,
            domain: domain.into(),
            statement: statement.into(),
        }
    }

    /// The sign-in message for `challenge`.
    pub fn message_for(&self, challenge: &AuthChallenge) -> Result<String, LitsecError> {
        let siwe = SiweMessage::with_capabilities(
            &self.domain,
            self.wallet.address(),
            &self.statement,
            &challenge.uri,
            &challenge.nonce,
            &challenge.issued_at,
            &challenge.expiration,
            &challenge.resource_ability_requests,
        )?;
        Ok(siwe.to_message())
    }
}

#[async_trait]
impl AuthNeeded for WalletAuthCallback {
    async fn sign_challenge(&self, challenge: &AuthChallenge) -> Result<AuthSig, LitsecError> {
        let to_sign = self.message_for(challenge)?;
        debug!(address = %self.wallet.address(), uri = %challenge.uri, "requesting capability signature");
        generate_auth_sig(&self.wallet, to_sign).await
    }
}

/// Negotiates short-lived session credentials.
pub struct SessionAuthenticator {
    network: Arc<dyn NetworkClient>,
    chain: String,
    domain: String,
    statement: String,
}

impl SessionAuthenticator {
    pub fn new(network: Arc<dyn NetworkClient>, config: &ClientConfig) -> Self {
        Self {
            network,
            chain: config.chain.clone(),
            domain: config.siwe_domain.clone(),
            statement: config.siwe_statement.clone(),
        }
    }

    /// Obtain a credential for `scope` that expires `ttl` from now.
    ///
    /// A signing failure aborts the whole exchange.
    pub async fn get_session_credential(
        &self,
        signer: &ConnectedWallet,
        scope: Vec<ResourceAbilityRequest>,
        ttl: chrono::Duration,
    ) -> Result<SessionCredential, LitsecError> {
        let expiration = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| LitsecError::Config(format!("session lifetime {ttl} is out of range")))?;
        let params = SessionSigsParams {
            chain: self.chain.clone(),
            expiration: iso8601(expiration),
            resource_ability_requests: scope,
        };
        let callback =
            WalletAuthCallback::new(signer.clone(), self.domain.clone(), self.statement.clone());
        let credential = self.network.get_session_sigs(&params, &callback).await?;
        info!(
            address = %signer.address(),
            expires = %credential.expiration,
            nodes = credential.sigs.len(),
            "session credential acquired"
        );
        Ok(credential)
    }
}
