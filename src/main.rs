use clap::Parser;
use httpserv::config::{Args, Config};
use httpserv::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(args.log_level())
        .init();

    let cfg = Config::from_args(args)
        .and_then(|cfg| cfg.validate().map(|()| cfg))
        .inspect_err(|e| tracing::error!("Startup failed: {:#}", e))?;

    tokio::select! {
        res = server::listener::run(&cfg) => {
            res.inspect_err(|e| tracing::error!("Server failed: {:#}", e))?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
