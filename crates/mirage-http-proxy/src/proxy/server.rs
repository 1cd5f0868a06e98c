//! ProxyServer struct and main run loop.
//!
//! The server owns the mode controller, the repository and the recorder and
//! player built on it, and serves HTTP/1.1 connections one task each.

use super::client::create_http_client;
use super::context::RequestHandlerContext;
use super::forwarding::Recorder;
use super::handler::handle_request;
use crate::admin_api::ADMIN_PREFIX;
use crate::config::Config;
use crate::metrics;
use crate::recording::{create_repository, InteractionRepository, ModeController, Player};
use anyhow::Context;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// The main intermediary server.
pub struct ProxyServer {
    config: Arc<Config>,
    mode: ModeController,
    repository: Arc<dyn InteractionRepository>,
    recorder: Recorder,
    player: Player,
}

impl ProxyServer {
    /// Create a server with the repository described by the configuration.
    pub fn new(config: Config) -> Result<Self, anyhow::Error> {
        let repository = create_repository(&config.recording);
        Self::with_repository(config, repository)
    }

    /// Create a server on top of an existing repository.
    pub fn with_repository(
        config: Config,
        repository: Arc<dyn InteractionRepository>,
    ) -> Result<Self, anyhow::Error> {
        config.validate()?;
        metrics::init();

        let http_client =
            create_http_client(&config.upstream).context("Failed to create upstream client")?;
        let recorder = Recorder::new(
            http_client,
            Arc::clone(&repository),
            config.upstream.timeout(),
        );
        let player = Player::new(Arc::clone(&repository));

        Ok(Self {
            mode: ModeController::new(config.mode),
            config: Arc::new(config),
            repository,
            recorder,
            player,
        })
    }

    /// Handle to the live mode; changes apply to the next request.
    pub fn mode(&self) -> &ModeController {
        &self.mode
    }

    pub fn repository(&self) -> &Arc<dyn InteractionRepository> {
        &self.repository
    }

    /// Bind the configured address and serve until an accept error.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let addr = self.config.listen.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<(), anyhow::Error> {
        let addr = listener.local_addr()?;
        info!("Listening on http://{}", addr);
        info!("Mode: {}", self.mode.get());
        info!(
            "Upstream target taken from the '{}' query parameter",
            self.config.upstream.target_param
        );
        info!("Admin endpoints under {}", ADMIN_PREFIX);

        let server = Arc::new(self);

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let server = Arc::clone(&server);

            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let server = Arc::clone(&server);
                    async move { server.handle_request_internal(req).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Error serving connection from {}: {}", remote_addr, err);
                }
            });
        }
    }

    /// Internal request handler that builds the context and delegates to handler module.
    async fn handle_request_internal(
        &self,
        req: hyper::Request<hyper::body::Incoming>,
    ) -> Result<hyper::Response<Full<Bytes>>, Infallible> {
        let ctx = RequestHandlerContext {
            mode: &self.mode,
            recorder: &self.recorder,
            player: &self.player,
            repository: &self.repository,
            target_param: &self.config.upstream.target_param,
        };

        handle_request(&ctx, req).await
    }
}
