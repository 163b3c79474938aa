mod connector;
mod keypair;
mod rpc_wallet;
pub mod siwe;
mod wallet;

pub use connector::{generate_auth_sig, ConnectedWallet, WalletConnector};
pub use keypair::{verify_session_signature, SessionKeypair};
pub use rpc_wallet::JsonRpcWallet;
pub use siwe::{Recap, SiweMessage};
pub use wallet::{
    address_from_verifying_key, eip191_hash, recover_address, verify_auth_sig, LocalWallet,
    WalletProvider,
};
