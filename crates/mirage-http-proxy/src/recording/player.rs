//! Playback of recorded interactions.

use super::store::{InteractionRepository, RepositoryError};
use super::types::{Interaction, RecordedRequest};
use hyper::http::request::Parts;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// No recording matches the request
    #[error("no recording for {method} {url} (fingerprint {fingerprint})")]
    NoRecording {
        method: String,
        url: String,
        fingerprint: String,
    },
    /// The repository failed for a reason other than a missing recording
    #[error("failed to retrieve recording: {0}")]
    Retrieval(#[source] RepositoryError),
}

/// Answers requests from previously recorded interactions
pub struct Player {
    repository: Arc<dyn InteractionRepository>,
}

impl Player {
    pub fn new(repository: Arc<dyn InteractionRepository>) -> Self {
        Self { repository }
    }

    /// Find the recorded interaction matching an inbound request.
    pub fn handle(&self, parts: &Parts, body: &[u8]) -> Result<Interaction, PlayerError> {
        let request = RecordedRequest::from_parts(&parts.method, &parts.uri, &parts.headers, body);
        self.lookup(&request)
    }

    /// Find the recorded interaction matching an already-captured request.
    pub fn lookup(&self, request: &RecordedRequest) -> Result<Interaction, PlayerError> {
        let fingerprint = self.repository.fingerprinter().fingerprint(request);

        match self.repository.find(&fingerprint) {
            Ok(interaction) => {
                debug!(
                    "Replaying interaction {} for {} {} (fingerprint {})",
                    interaction.id, request.method, request.url, fingerprint
                );
                Ok(interaction)
            }
            Err(RepositoryError::NotFound(_)) => Err(PlayerError::NoRecording {
                method: request.method.clone(),
                url: request.url.clone(),
                fingerprint,
            }),
            Err(e) => Err(PlayerError::Retrieval(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::InMemoryRepository;
    use crate::recording::store::FileRepository;
    use crate::recording::types::{InteractionMetadata, RecordedResponse};
    use chrono::Utc;
    use hyper::Request;
    use tempfile::TempDir;

    fn parts(method: &str, uri: &str, tenant: &str) -> Parts {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("x-tenant", tenant)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    fn record(repository: &dyn InteractionRepository, parts: &Parts, body: &[u8]) -> Interaction {
        let interaction = Interaction::new(
            Utc::now(),
            RecordedRequest::from_parts(&parts.method, &parts.uri, &parts.headers, body),
            RecordedResponse {
                status_code: 200,
                headers: Default::default(),
                body: br#"{"id":1}"#.to_vec(),
            },
            InteractionMetadata {
                target: "api.users.com".to_string(),
                duration_ms: 3,
            },
        );
        repository.save(&interaction).unwrap();
        interaction
    }

    #[test]
    fn test_player_replays_matching_request() {
        let repo = Arc::new(InMemoryRepository::new());
        let inbound = parts("GET", "/users/1?target=api.users.com", "org-123");
        let recorded = record(repo.as_ref(), &inbound, b"");

        let player = Player::new(repo);
        let replayed = player.handle(&inbound, b"").unwrap();
        assert_eq!(replayed, recorded);
    }

    #[test]
    fn test_player_header_mismatch_is_no_recording() {
        let repo = Arc::new(InMemoryRepository::new());
        record(
            repo.as_ref(),
            &parts("GET", "/users/1?target=api.users.com", "org-123"),
            b"",
        );

        let player = Player::new(repo);
        let err = player
            .handle(&parts("GET", "/users/1?target=api.users.com", "org-456"), b"")
            .unwrap_err();

        match err {
            PlayerError::NoRecording {
                method,
                url,
                fingerprint,
            } => {
                assert_eq!(method, "GET");
                assert_eq!(url, "/users/1?target=api.users.com");
                assert_eq!(fingerprint.len(), 64);
            }
            other => panic!("expected NoRecording, got {other:?}"),
        }
    }

    #[test]
    fn test_player_body_mismatch_is_no_recording() {
        let repo = Arc::new(InMemoryRepository::new());
        let inbound = parts("POST", "/accounts", "org-123");
        record(repo.as_ref(), &inbound, br#"{"name":"alice"}"#);

        let player = Player::new(repo);
        assert!(matches!(
            player.handle(&inbound, br#"{"name":"bob"}"#),
            Err(PlayerError::NoRecording { .. })
        ));
    }

    #[test]
    fn test_player_storage_failure_is_retrieval_error() {
        let dir = TempDir::new().unwrap();
        let repo = Arc::new(FileRepository::new(dir.path()));
        let inbound = parts("GET", "/users", "org-123");

        let fingerprint = repo.fingerprinter().fingerprint(&RecordedRequest::from_parts(
            &inbound.method,
            &inbound.uri,
            &inbound.headers,
            b"",
        ));
        let partition = dir.path().join("api_users_com");
        std::fs::create_dir_all(&partition).unwrap();
        std::fs::write(partition.join(format!("{fingerprint}.json")), b"[]").unwrap();

        let player = Player::new(repo);
        let err = player.handle(&inbound, b"").unwrap_err();
        assert!(matches!(
            err,
            PlayerError::Retrieval(RepositoryError::Decode { .. })
        ));
    }
}
