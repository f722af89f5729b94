//! Lanshare CLI - share a directory on the local network with bulk download
//! and delete.

mod cli;
mod error;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use lanshare_core::router;
use log::info;
use log::warn;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_level().as_str()))
        .format_timestamp_secs()
        .init();

    let config = cli.share_config();
    config
        .validate()
        .map_err(|e| error::convert_config_error(e, &config))?;

    let addr = cli.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| error::convert_bind_error(e, addr))?;

    info!(
        "sharing {} on http://{} ({:?} archives, {:?})",
        config.root.display(),
        listener.local_addr()?,
        config.archive_mode,
        config.delete_policy
    );

    axum::serve(listener, router(config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for Ctrl-C: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
