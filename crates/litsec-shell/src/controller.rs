use litsec_identity::{ConnectedWallet, WalletConnector, WalletProvider};
use litsec_sdk::{
    ActionInvoker, ClientConfig, ExecuteJsResponse, HttpNetworkClient, NetworkClient,
    SessionAuthenticator,
};
use litsec_types::{EncryptedPayload, LitsecError, ResourceAbilityRequest};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::state::AppState;

/// Builds a fresh network client for each wallet connection.
pub type NetworkFactory =
    Box<dyn Fn(&ClientConfig) -> Result<Arc<dyn NetworkClient>, LitsecError> + Send + Sync>;

/// Owns the UI state and drives wallet connection and action runs.
///
/// Every operation records its outcome in the state; none of them return
/// errors or panic.
pub struct AppController {
    state: AppState,
    config: ClientConfig,
    connector: WalletConnector,
    network_factory: NetworkFactory,
    wallet: Option<ConnectedWallet>,
    network: Option<Arc<dyn NetworkClient>>,
}

impl AppController {
    pub fn new(
        config: ClientConfig,
        provider: Option<Arc<dyn WalletProvider>>,
        network_factory: NetworkFactory,
    ) -> Self {
        Self {
            state: AppState::default(),
            config,
            connector: WalletConnector::new(provider),
            network_factory,
            wallet: None,
            network: None,
        }
    }

    /// A controller that talks to the configured nodes over HTTP.
    pub fn with_http_network(config: ClientConfig, provider: Option<Arc<dyn WalletProvider>>) -> Self {
        Self::new(
            config,
            provider,
            Box::new(|config| {
                let client: Arc<dyn NetworkClient> = Arc::new(HttpNetworkClient::new(config.clone())?);
                Ok(client)
            }),
        )
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn set_encrypted_data(&mut self, text: impl Into<String>) {
        self.state.encrypted_data = text.into();
    }

    pub fn set_prompt(&mut self, text: impl Into<String>) {
        self.state.prompt = text.into();
    }

    /// Connect the wallet, then the network.
    pub async fn connect_wallet(&mut self) {
        if self.state.is_connecting {
            warn!("connect already in progress");
            return;
        }
        self.state.begin_connect();
        match self.try_connect().await {
            Ok((wallet, network)) => {
                self.state.connect_succeeded(wallet.address());
                self.wallet = Some(wallet);
                self.network = Some(network);
            }
            Err(e) => {
                error!(error = %e, "wallet connection failed");
                self.state.connect_failed(e.to_string());
            }
        }
    }

    async fn try_connect(&self) -> Result<(ConnectedWallet, Arc<dyn NetworkClient>), LitsecError> {
        let wallet = self.connector.connect().await?;
        let network = (self.network_factory)(&self.config)?;
        network.connect().await?;
        Ok((wallet, network))
    }

    /// Parse the secret, negotiate a session and run the action.
    pub async fn run_action(&mut self) {
        if self.state.is_loading {
            warn!("action already running");
            return;
        }
        let (Some(wallet), Some(network)) = (self.wallet.clone(), self.network.clone()) else {
            self.state
                .report("Please connect your wallet to access the application.".into());
            return;
        };
        self.state.begin_invoke();
        match self.try_run(&wallet, network).await {
            Ok(result) => {
                info!(response = %result.response, "lit action result");
                self.state.invoke_succeeded(result.response);
            }
            Err(e) => {
                error!(error = %e, "error running lit action");
                self.state.invoke_failed(e.to_string());
            }
        }
    }

    async fn try_run(
        &self,
        wallet: &ConnectedWallet,
        network: Arc<dyn NetworkClient>,
    ) -> Result<ExecuteJsResponse, LitsecError> {
        // Reject bad input before touching the network.
        let payload = EncryptedPayload::parse(&self.state.encrypted_data)?;

        let credential = SessionAuthenticator::new(network.clone(), &self.config)
            .get_session_credential(
                wallet,
                vec![ResourceAbilityRequest::execute_any_action()],
                self.config.session_ttl()?,
            )
            .await?;

        ActionInvoker::new(network)
            .invoke(
                &credential,
                &self.config.action_ipfs_id,
                &self.config.access_control_conditions,
                &payload,
                &self.state.prompt,
            )
            .await
    }

    pub fn disconnect(&mut self) {
        self.wallet = None;
        self.network = None;
        self.state.disconnect();
        info!("wallet disconnected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Phase;
    use async_trait::async_trait;
    use chrono::Utc;
    use litsec_identity::LocalWallet;
    use litsec_sdk::{AuthChallenge, AuthNeeded, ExecuteJsParams, SessionCredential, SessionSigsParams};
    use litsec_types::{iso8601, parse_iso8601, Address};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Counts calls and replays queued execute results.
    #[derive(Default)]
    struct MockNetwork {
        connects: AtomicUsize,
        session_requests: AtomicUsize,
        executions: AtomicUsize,
        results: Mutex<Vec<Result<ExecuteJsResponse, LitsecError>>>,
    }

    impl MockNetwork {
        fn with_results(results: Vec<Result<ExecuteJsResponse, LitsecError>>) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results),
                ..Self::default()
            })
        }
    }

    #[async_trait]
    impl NetworkClient for MockNetwork {
        async fn connect(&self) -> Result<(), LitsecError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn is_ready(&self) -> bool {
            true
        }

        async fn latest_blockhash(&self) -> Result<String, LitsecError> {
            Ok("0xabc".into())
        }

        async fn get_session_sigs(
            &self,
            params: &SessionSigsParams,
            auth: &dyn AuthNeeded,
        ) -> Result<SessionCredential, LitsecError> {
            self.session_requests.fetch_add(1, Ordering::SeqCst);
            let auth_sig = auth
                .sign_challenge(&AuthChallenge {
                    uri: "lit:session:mock".into(),
                    issued_at: iso8601(Utc::now()),
                    expiration: params.expiration.clone(),
                    resource_ability_requests: params.resource_ability_requests.clone(),
                    nonce: "0xabc".into(),
                })
                .await?;
            Ok(SessionCredential {
                sigs: BTreeMap::new(),
                resource_ability_requests: params.resource_ability_requests.clone(),
                authorized_by: auth_sig.address,
                issued_at: Utc::now(),
                expiration: parse_iso8601(&params.expiration)?,
            })
        }

        async fn execute_js(
            &self,
            _params: &ExecuteJsParams<'_>,
        ) -> Result<ExecuteJsResponse, LitsecError> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            self.results.lock().unwrap().remove(0)
        }
    }

    struct RefusingWallet;

    #[async_trait]
    impl WalletProvider for RefusingWallet {
        async fn request_accounts(&self) -> Result<Vec<Address>, LitsecError> {
            Err(LitsecError::UserRejected("User rejected the request.".into()))
        }

        async fn sign_message(&self, _: &Address, _: &str) -> Result<String, LitsecError> {
            unreachable!("never connected")
        }
    }

    fn answer(text: &str) -> Result<ExecuteJsResponse, LitsecError> {
        Ok(ExecuteJsResponse {
            success: true,
            response: text.into(),
            logs: String::new(),
        })
    }

    fn controller(
        provider: Option<Arc<dyn WalletProvider>>,
        network: Arc<MockNetwork>,
    ) -> AppController {
        controller_with(ClientConfig::default(), provider, network)
    }

    fn controller_with(
        config: ClientConfig,
        provider: Option<Arc<dyn WalletProvider>>,
        network: Arc<MockNetwork>,
    ) -> AppController {
        AppController::new(
            config,
            provider,
            Box::new(move |_| {
                let client: Arc<dyn NetworkClient> = network.clone();
                Ok(client)
            }),
        )
    }

    fn local_wallet() -> (LocalWallet, Option<Arc<dyn WalletProvider>>) {
        let wallet = LocalWallet::random();
        let provider: Arc<dyn WalletProvider> = Arc::new(wallet.clone());
        (wallet, Some(provider))
    }

    const SECRET: &str = r#"{"encryptedData":"E","dataToEncryptHash":"H"}"#;

    #[tokio::test]
    async fn connect_then_run() {
        let network = MockNetwork::with_results(vec![answer("4")]);
        let (wallet, provider) = local_wallet();
        let mut app = controller(provider, network.clone());

        app.connect_wallet().await;
        assert_eq!(app.state().phase, Phase::Connected);
        assert_eq!(app.state().wallet_address, Some(wallet.address()));
        assert_eq!(network.connects.load(Ordering::SeqCst), 1);

        app.set_encrypted_data(SECRET);
        app.set_prompt("What is 2+2?");
        app.run_action().await;
        assert_eq!(app.state().phase, Phase::Result);
        assert_eq!(app.state().response.as_deref(), Some("4"));
        assert!(!app.state().is_loading);
    }

    #[tokio::test]
    async fn missing_wallet_reports_install_message() {
        let network = MockNetwork::with_results(vec![]);
        let mut app = controller(None, network.clone());
        app.connect_wallet().await;
        assert_eq!(app.state().phase, Phase::Idle);
        assert_eq!(
            app.state().error.as_deref(),
            Some("Please install a wallet provider to use this application")
        );
        assert_eq!(network.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejected_connect_skips_network() {
        let network = MockNetwork::with_results(vec![]);
        let mut app = controller(Some(Arc::new(RefusingWallet)), network.clone());
        app.connect_wallet().await;
        assert!(!app.state().is_connected());
        assert!(!app.state().is_connecting);
        assert!(app.state().error.is_some());
        assert_eq!(network.connects.load(Ordering::SeqCst), 0);

        app.run_action().await;
        assert_eq!(network.session_requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_secret_makes_no_network_calls() {
        let network = MockNetwork::with_results(vec![answer("unused")]);
        let (_, provider) = local_wallet();
        let mut app = controller(provider, network.clone());
        app.connect_wallet().await;

        app.set_encrypted_data("not json");
        app.run_action().await;
        assert_eq!(app.state().phase, Phase::Error);
        assert_eq!(
            app.state().error.as_deref(),
            Some("Invalid JSON format for encrypted data")
        );
        assert_eq!(network.session_requests.load(Ordering::SeqCst), 0);
        assert_eq!(network.executions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn remote_failure_clears_busy_flag() {
        let network = MockNetwork::with_results(vec![Err(LitsecError::RemoteExecution(
            "openai request failed: 401".into(),
        ))]);
        let (_, provider) = local_wallet();
        let mut app = controller(provider, network.clone());
        app.connect_wallet().await;
        app.set_encrypted_data(SECRET);
        app.run_action().await;

        assert_eq!(app.state().phase, Phase::Error);
        assert!(!app.state().is_loading);
        assert_eq!(
            app.state().error.as_deref(),
            Some("remote execution failed: openai request failed: 401")
        );
    }

    #[tokio::test]
    async fn rerun_overwrites_previous_response() {
        let network = MockNetwork::with_results(vec![answer("first"), answer("second")]);
        let (_, provider) = local_wallet();
        let mut app = controller(provider, network.clone());
        app.connect_wallet().await;
        app.set_encrypted_data(SECRET);

        app.run_action().await;
        assert_eq!(app.state().response.as_deref(), Some("first"));
        app.run_action().await;
        assert_eq!(app.state().response.as_deref(), Some("second"));
        assert_eq!(network.session_requests.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn huge_session_ttl_fails_without_panicking() {
        let network = MockNetwork::with_results(vec![answer("unused")]);
        let (_, provider) = local_wallet();
        let config = ClientConfig {
            session_ttl_secs: 10_000_000_000_000,
            ..ClientConfig::default()
        };
        let mut app = controller_with(config, provider, network.clone());
        app.connect_wallet().await;
        app.set_encrypted_data(SECRET);
        app.run_action().await;

        assert_eq!(app.state().phase, Phase::Error);
        assert!(!app.state().is_loading);
        assert!(app.state().error.as_deref().unwrap().contains("out of range"));
        assert_eq!(network.session_requests.load(Ordering::SeqCst), 0);
        assert_eq!(network.executions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn run_before_connect_is_reported() {
        let network = MockNetwork::with_results(vec![]);
        let mut app = controller(None, network.clone());
        app.set_encrypted_data(SECRET);
        app.run_action().await;
        assert_eq!(app.state().phase, Phase::Idle);
        assert_eq!(
            app.state().error.as_deref(),
            Some("Please connect your wallet to access the application.")
        );
    }

    #[tokio::test]
    async fn disconnect_drops_wallet() {
        let network = MockNetwork::with_results(vec![]);
        let (_, provider) = local_wallet();
        let mut app = controller(provider, network);
        app.connect_wallet().await;
        app.set_prompt("kept");
        app.disconnect();
        assert!(!app.state().is_connected());
        assert_eq!(app.state().prompt, "kept");
    }
}
