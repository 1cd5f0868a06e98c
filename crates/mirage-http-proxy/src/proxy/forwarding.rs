//! Request forwarding for record mode.
//!
//! The [`Recorder`] sends a live request to the real target, captures the
//! exchange as an [`Interaction`] and hands it to the repository.

use super::client::HttpClient;
use super::target::normalize_target_url;
use crate::metrics;
use crate::recording::{
    Interaction, InteractionMetadata, InteractionRepository, RecordedRequest, RecordedResponse,
};
use chrono::Utc;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::http::request::Parts;
use hyper::{header, Request, Uri};
use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },
    #[error("failed to build upstream request: {0}")]
    BuildRequest(#[source] hyper::http::Error),
    #[error("upstream request failed: {0}")]
    Upstream(#[source] hyper_util::client::legacy::Error),
    #[error("upstream did not answer within {0:?}")]
    Timeout(Duration),
    #[error("failed to read upstream response body: {0}")]
    ReadBody(#[source] hyper::Error),
}

impl RecorderError {
    fn invalid_target(target: &str, reason: impl Display) -> Self {
        RecorderError::InvalidTarget {
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Forwards requests to real targets and records what comes back.
pub struct Recorder {
    http_client: HttpClient,
    repository: Arc<dyn InteractionRepository>,
    timeout: Duration,
}

impl Recorder {
    pub fn new(
        http_client: HttpClient,
        repository: Arc<dyn InteractionRepository>,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            repository,
            timeout,
        }
    }

    /// Forward an inbound request to `target` and record the exchange.
    ///
    /// The interaction is returned even when it could not be persisted. The
    /// timeout covers the whole exchange, response body included. Dropping the
    /// returned future aborts the upstream call and records nothing.
    pub async fn handle(
        &self,
        parts: &Parts,
        body: Bytes,
        target: &str,
    ) -> Result<Interaction, RecorderError> {
        let url = normalize_target_url(target)
            .map_err(|e| RecorderError::invalid_target(target, e))?;
        let uri: Uri = url
            .parse()
            .map_err(|e| RecorderError::invalid_target(target, e))?;
        if uri.host().is_none() {
            return Err(RecorderError::invalid_target(target, "missing host"));
        }

        debug!("Forwarding {} {} to {}", parts.method, parts.uri, uri);

        let mut upstream_req = Request::builder().method(parts.method.clone()).uri(uri);

        // Host comes from the target URL; everything else goes through as-is
        for (name, value) in parts.headers.iter() {
            if name != header::HOST {
                upstream_req = upstream_req.header(name, value);
            }
        }

        let upstream_req = upstream_req
            .body(Full::new(body.clone()))
            .map_err(RecorderError::BuildRequest)?;

        let timestamp = Utc::now();
        let start = Instant::now();

        let (status, headers, response_body) =
            tokio::time::timeout(self.timeout, self.exchange(upstream_req))
                .await
                .map_err(|_| RecorderError::Timeout(self.timeout))??;

        let duration_ms = start.elapsed().as_millis() as u64;

        let interaction = Interaction::new(
            timestamp,
            RecordedRequest::from_parts(&parts.method, &parts.uri, &parts.headers, &body),
            RecordedResponse::from_parts(status, &headers, &response_body),
            InteractionMetadata {
                target: target.to_string(),
                duration_ms,
            },
        );

        metrics::record_capture(parts.method.as_str(), duration_ms);

        if let Err(e) = self.repository.save(&interaction) {
            warn!(
                "Failed to persist interaction {} for {} {}: {}",
                interaction.id, interaction.request.method, interaction.request.url, e
            );
            metrics::record_persist_failure();
        } else {
            debug!(
                "Recorded {} {} -> {} in {}ms",
                interaction.request.method, interaction.request.url, status, duration_ms
            );
        }

        Ok(interaction)
    }

    async fn exchange(
        &self,
        request: Request<Full<Bytes>>,
    ) -> Result<(u16, hyper::HeaderMap, Bytes), RecorderError> {
        let response = self
            .http_client
            .request(request)
            .await
            .map_err(RecorderError::Upstream)?;

        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(RecorderError::ReadBody)?
            .to_bytes();

        Ok((parts.status.as_u16(), parts.headers, body))
    }
}
