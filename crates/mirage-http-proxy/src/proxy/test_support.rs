//! Shared fixtures for proxy tests: a local echo upstream and a broken repository.

use crate::recording::{
    header_values, Fingerprinter, Interaction, InteractionRepository, RepositoryError,
};
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;

/// Start an upstream on an ephemeral port that echoes each request as JSON.
///
/// `/slow` answers after five seconds, `/missing` answers 404. Every response
/// carries two `set-cookie` headers.
pub(crate) async fn spawn_echo_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service_fn(echo))
                    .await;
            });
        }
    });

    addr
}

async fn echo(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    if parts.uri.path() == "/slow" {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }

    let body = body
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .unwrap_or_default();

    let payload = serde_json::json!({
        "method": parts.method.as_str(),
        "uri": parts.uri.to_string(),
        "headers": header_values(&parts.headers),
        "body": String::from_utf8_lossy(&body),
    });

    let status = if parts.uri.path() == "/missing" { 404 } else { 200 };

    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .header("set-cookie", "a=1")
        .header("set-cookie", "b=2")
        .body(Full::new(Bytes::from(payload.to_string())))
        .unwrap())
}

/// A port on 127.0.0.1 with nothing listening.
pub(crate) async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Repository whose every operation fails with an I/O error.
#[derive(Default)]
pub(crate) struct FailingRepository {
    fingerprinter: Fingerprinter,
}

impl FailingRepository {
    fn failure(action: &'static str) -> RepositoryError {
        RepositoryError::Io {
            action,
            path: PathBuf::from("/unavailable"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
        }
    }
}

impl InteractionRepository for FailingRepository {
    fn save(&self, _interaction: &Interaction) -> Result<(), RepositoryError> {
        Err(Self::failure("write"))
    }

    fn find(&self, _fingerprint: &str) -> Result<Interaction, RepositoryError> {
        Err(Self::failure("read"))
    }

    fn find_all(&self) -> Result<Vec<Interaction>, RepositoryError> {
        Err(Self::failure("read"))
    }

    fn clear(&self) -> Result<usize, RepositoryError> {
        Err(Self::failure("remove"))
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Err(Self::failure("read"))
    }

    fn fingerprinter(&self) -> &Fingerprinter {
        &self.fingerprinter
    }
}
