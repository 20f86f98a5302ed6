use {
    clap::Parser,
    config::{Cli, Command, WalletArgs},
    dev_proxy::ServerConfig,
    walletkit_client::{ClientError, WalletKit},
};

mod config;
mod log;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = log::init(&cli.log)?;

    match cli.command {
        Command::Serve(args) => serve(args.into_config()?).await,
        Command::Preview(args) => serve(args.into_config()?).await,
        Command::Wallet(args) => wallet(args).await,
    }
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let (_, server) = dev_proxy::bind(config, shutdown_signal()).await?;

    server.await;

    Ok(())
}

async fn wallet(args: WalletArgs) -> anyhow::Result<()> {
    let core = args.core()?;
    let wallet = WalletKit::init(core, args.metadata()).await?;

    tracing::info!(
        project_id = %wallet.project_id(),
        client_id = %wallet.client_id().to_did_key(),
        relay = wallet.relay_address(),
        "wallet initialized"
    );

    shutdown_signal().await;

    match wallet.disconnect().await {
        Ok(()) | Err(ClientError::NotConnected) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "failed to listen for ctrl-c");
    }

    tracing::info!("shutting down");
}
