use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use relnotes_server::config::Config;

#[derive(Parser)]
#[command(name = "relnotes-server", version, about = "AI changelog service")]
struct Cli {
    /// Override RELNOTES_PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    let addr = SocketAddr::new(config.bind.parse()?, config.port);
    let state = relnotes_server::app_state(config);

    let listener = TcpListener::bind(addr).await?;
    eprintln!("relnotes-server listening on http://{addr}");

    relnotes_server::serve(listener, state).await
}
