//! Lit Secrets shell
//!
//! Connect a wallet, paste an encrypted secret and a prompt, and run the
//! Lit Action that decrypts the secret and answers the prompt.

use anyhow::{Context, Result};
use clap::Parser;
use litsec_identity::{LocalWallet, WalletProvider};
use litsec_shell::commands::HELP;
use litsec_shell::{render, AppController, Command, ShellConfig, WalletConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "litsec")]
#[command(about = "Run a Lit Action against an encrypted secret")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint of the wallet to connect
    #[arg(long, conflicts_with_all = ["private_key_file", "random_wallet"])]
    wallet_rpc: Option<String>,

    /// Sign with the hex private key in this file
    #[arg(long, conflicts_with = "random_wallet")]
    private_key_file: Option<PathBuf>,

    /// Sign with a throwaway key generated at startup
    #[arg(long)]
    random_wallet: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => ShellConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ShellConfig::default(),
    };
    if cli.wallet_rpc.is_some() || cli.private_key_file.is_some() {
        config.wallet = WalletConfig {
            rpc_url: cli.wallet_rpc,
            private_key_file: cli.private_key_file,
        };
    }

    let provider: Option<Arc<dyn WalletProvider>> = if cli.random_wallet {
        let wallet = LocalWallet::random();
        info!(address = %wallet.address(), "using throwaway wallet");
        let wallet: Arc<dyn WalletProvider> = Arc::new(wallet);
        Some(wallet)
    } else {
        config.wallet.provider().context("setting up wallet")?
    };

    info!(network = %config.client.network, nodes = config.client.nodes.len(), "starting");
    let mut app = AppController::with_http_network(config.client, provider);
    repl(&mut app).await
}

async fn repl(app: &mut AppController) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout.write_all(render(app.state()).as_bytes()).await?;
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let Some(command) = Command::parse(&line) else {
            continue;
        };
        match command {
            Command::Connect => app.connect_wallet().await,
            Command::Secret(Some(text)) => app.set_encrypted_data(text),
            Command::Secret(None) => {
                let mut block = Vec::new();
                while let Some(line) = lines.next_line().await? {
                    if line.trim().is_empty() {
                        break;
                    }
                    block.push(line);
                }
                app.set_encrypted_data(block.join("\n"));
            }
            Command::Prompt(text) => app.set_prompt(text),
            Command::Run => app.run_action().await,
            Command::Show => {}
            Command::Disconnect => app.disconnect(),
            Command::Help => {
                stdout.write_all(format!("{HELP}\n").as_bytes()).await?;
                continue;
            }
            Command::Quit => break,
            Command::Unknown(word) => {
                stdout
                    .write_all(format!("unknown command '{word}', try 'help'\n").as_bytes())
                    .await?;
                continue;
            }
        }
        stdout.write_all(render(app.state()).as_bytes()).await?;
    }
    Ok(())
}
