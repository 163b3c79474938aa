pub mod config;
mod http_client;
mod invoker;
pub mod network;
mod session;

pub use config::ClientConfig;
pub use http_client::HttpNetworkClient;
pub use invoker::{ActionInvoker, JsParams};
pub use network::{
    AuthChallenge, AuthNeeded, ExecuteJsParams, ExecuteJsResponse, NetworkClient,
    SessionCredential, SessionSig, SessionSigsParams,
};
pub use session::{SessionAuthenticator, WalletAuthCallback};
