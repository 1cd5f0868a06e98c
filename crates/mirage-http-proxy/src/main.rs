use anyhow::Context;
use clap::Parser;
use mirage_http_proxy::config::Config;
use mirage_http_proxy::logging;
use mirage_http_proxy::proxy::ProxyServer;
use mirage_http_proxy::recording::Mode;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "mirage-http-proxy", version, about)]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "MIRAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Listen port, overrides the configuration file
    #[arg(short, long, env = "MIRAGE_PORT")]
    port: Option<u16>,

    /// Initial mode: record or playback
    #[arg(short, long, env = "MIRAGE_MODE")]
    mode: Option<Mode>,

    /// Directory holding recorded interactions
    #[arg(short, long, env = "MIRAGE_RECORDINGS")]
    recordings: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(port) = self.port {
            config.listen.port = port;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(recordings) = self.recordings {
            config.recording.path = recordings;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config()?;
    logging::init(&config.logging)?;

    info!("Starting mirage-http-proxy v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Recordings: {} ({:?} backend)",
        config.recording.path.display(),
        config.recording.backend
    );

    let server = ProxyServer::new(config)?;

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}
