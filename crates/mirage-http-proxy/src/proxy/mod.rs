//! Intermediary server module.
//!
//! # Module Structure
//!
//! - `server` - ProxyServer struct and main run loop
//! - `handler` - Admin dispatch and record/playback handling
//! - `forwarding` - The Recorder, forwarding to real targets
//! - `target` - Target URL normalization
//! - `client` - HTTP client creation and configuration
//! - `tls` - Certificate-skipping TLS configuration
//! - `headers` - Marker headers and replayable header rules

mod client;
mod context;
mod forwarding;
mod handler;
mod headers;
mod server;
pub mod target;
mod tls;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{create_http_client, HttpClient};
pub use context::RequestHandlerContext;
pub use forwarding::{Recorder, RecorderError};
pub use handler::{handle_request, resolve_target};
pub use headers::{X_MIRAGE_RECORDED, X_MIRAGE_REPLAYED};
pub use server::ProxyServer;
