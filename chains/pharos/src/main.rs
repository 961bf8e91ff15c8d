use pharos_bot::inputs;
use pharos_bot::{AlloySessionFactory, CycleOrchestrator, PharosConfig, RunContext, WalletIdentity};

use anyhow::{Context, Result};
use clap::Parser;
use core_logic::{setup_logger, ProxyManager, RelaySelector, WalletManager, WorkerRunner};
use dotenv::dotenv;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "chains/pharos/config.toml")]
    config: String,
    /// Private keys file, one 0x-prefixed key per line
    #[arg(long)]
    keys: Option<String>,
    #[arg(long)]
    proxies: Option<String>,
    /// Transfer target addresses
    #[arg(long)]
    targets: Option<String>,
    /// Stop after this many cycles instead of running until Ctrl+C
    #[arg(long)]
    cycles: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let _log_guard = setup_logger();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    info!("Loading config from: {}", args.config);
    let mut config = PharosConfig::load(&args.config).context("Failed to load config")?;
    if let Some(keys) = args.keys {
        config.files.keys = keys;
    }
    if let Some(proxies) = args.proxies {
        config.files.proxies = proxies;
    }
    if let Some(targets) = args.targets {
        config.files.targets = targets;
    }
    info!(
        "Configuration loaded for {} (chain ID: {})",
        config.network.name, config.network.chain_id
    );

    let secrets = WalletManager::require_secrets(&config.files.keys)?;
    let wallets = secrets
        .into_iter()
        .map(|secret| WalletIdentity::from_secret(secret, config.network.chain_id))
        .collect::<Result<Vec<_>, _>>()?;

    let proxies = ProxyManager::load_proxies(&config.files.proxies)?;
    let mut relays = RelaySelector::new();
    relays.register(proxies.iter().map(|p| p.to_uri()));
    if relays.is_empty() {
        warn!("No proxies loaded, all traffic goes direct");
    }

    let targets = inputs::load_targets(&config.files.targets)?;

    info!(
        "Config: {} WALLET | {} ADDRESS | {} PROXY",
        wallets.len(),
        targets.len(),
        relays.len()
    );

    let cancel = WorkerRunner::shutdown_token();
    let factory = AlloySessionFactory::new(&config)?;
    let ctx = RunContext::new(config, wallets, targets, relays, cancel)?;

    CycleOrchestrator::new(ctx, factory).run(args.cycles).await
}
