use std::io;
use std::str::FromStr;

use alloy::primitives::Address;
use clap::Parser;
use eyre::Result;
use log::info;

mod client;
mod error;
mod init;
mod report;
mod watch;

use crate::client::EvmClient;
use crate::init::AppConfig;
use crate::report::TX_LOOKUP_PACING;

/// Balance shown by the report unless --address overrides it.
const DEFAULT_BALANCE_ADDRESS: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

#[derive(Parser, Debug)]
#[command(name = "peek_evm", version = "0.1.0")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, short = 'c', default_value = "data/peek.toml")]
    config: String,

    /// Endpoint URL override, ws(s):// or http(s)://.
    #[arg(long, short = 'u')]
    rpc_url: Option<String>,

    /// Address whose balance is reported.
    #[arg(long, short = 'a')]
    address: Option<Address>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut app_config = AppConfig::new(&cli.config)?;
    let _log_level = app_config.init_log()?;

    // Merge CLI arguments into AppConfig
    if let Some(rpc_url) = cli.rpc_url {
        app_config.eth.rpc_url = rpc_url;
    }
    let balance_address = match cli.address {
        Some(address) => address,
        None => Address::from_str(DEFAULT_BALANCE_ADDRESS)?,
    };

    info!(
        "loaded project id ({} chars), endpoint {}",
        app_config.eth.project_id.len(),
        app_config.eth.rpc_url
    );
    run(&app_config, balance_address).await
}

async fn run(config: &AppConfig, balance_address: Address) -> Result<()> {
    let client = EvmClient::connect(&config.eth.rpc_url).await?;
    println!("We have a connection");

    let mut stdout = io::stdout();
    report::run_report(&client, balance_address, TX_LOOKUP_PACING, &mut stdout).await?;

    let subscription = client.subscribe_new_heads().await?;
    println!("Subscribed to new block events");

    // The one-shot phase is done; the listener owns the rest of the process
    // lifetime. Awaiting its join handle is what keeps main alive, and its
    // first error is the process's exit diagnostic.
    let listener = tokio::spawn(async move {
        let mut out = io::stdout();
        watch::run_header_loop(watch::header_stream(subscription), &mut out).await
    });
    listener.await??;
    Ok(())
}
