//! HTTP client creation and configuration.
//!
//! This module provides the shared HTTP client used to forward requests to
//! upstream targets while recording.

use super::tls::insecure_client_config;
use crate::config::UpstreamConfig;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::{info, warn};

/// Type alias for the HTTP client used by the recorder.
pub type HttpClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Create a shared HTTP client for forwarding.
///
/// Upstream TLS certificates are not verified. Plain `http://` targets are
/// supported as well.
pub fn create_http_client(config: &UpstreamConfig) -> Result<HttpClient, rustls::Error> {
    let mut http_connector = HttpConnector::new();
    http_connector.set_connect_timeout(Some(config.connect_timeout()));
    http_connector.enforce_http(false); // Allow both HTTP and HTTPS

    warn!("TLS certificate verification DISABLED for upstream targets (testing only)");
    let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_tls_config(insecure_client_config()?)
        .https_or_http()
        .enable_http1()
        .wrap_connector(http_connector);

    let http_client = Client::builder(TokioExecutor::new()).build(https_connector);

    info!(
        "Upstream client configured (HTTP/1.1): timeout={}s, connect_timeout={}s",
        config.timeout_secs, config.connect_timeout_secs
    );

    Ok(http_client)
}
