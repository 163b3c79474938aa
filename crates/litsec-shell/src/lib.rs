pub mod commands;
pub mod config;
pub mod controller;
pub mod state;
pub mod view;

pub use commands::Command;
pub use config::{ShellConfig, WalletConfig};
pub use controller::{AppController, NetworkFactory};
pub use state::{AppState, Phase};
pub use view::render;
