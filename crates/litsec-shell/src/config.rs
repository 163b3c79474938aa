use litsec_identity::{JsonRpcWallet, LocalWallet, WalletProvider};
use litsec_sdk::ClientConfig;
use litsec_types::LitsecError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where signatures come from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// JSON-RPC endpoint of an external wallet.
    pub rpc_url: Option<String>,
    /// File holding a hex secp256k1 private key.
    pub private_key_file: Option<PathBuf>,
}

impl WalletConfig {
    /// Build the configured provider, if any. Having none is not an error
    /// here; connecting will report it.
    pub fn provider(&self) -> Result<Option<Arc<dyn WalletProvider>>, LitsecError> {
        match (&self.rpc_url, &self.private_key_file) {
            (Some(_), Some(_)) => Err(LitsecError::Config(
                "set either rpc_url or private_key_file, not both".into(),
            )),
            (Some(url), None) => {
                let wallet: Arc<dyn WalletProvider> = Arc::new(JsonRpcWallet::new(url.clone()));
                Ok(Some(wallet))
            }
            (None, Some(path)) => {
                let key = std::fs::read_to_string(path)
                    .map_err(|e| LitsecError::Config(format!("{}: {e}", path.display())))?;
                let wallet: Arc<dyn WalletProvider> = Arc::new(LocalWallet::from_hex(key.trim())?);
                Ok(Some(wallet))
            }
            (None, None) => Ok(None),
        }
    }
}

/// Top-level shell configuration file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub client: ClientConfig,
    pub wallet: WalletConfig,
}

impl ShellConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, LitsecError> {
        let config: Self = toml::from_str(text).map_err(|e| LitsecError::Config(e.to_string()))?;
        config.client.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, LitsecError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| LitsecError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
