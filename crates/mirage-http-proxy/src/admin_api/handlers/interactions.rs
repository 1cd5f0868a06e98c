//! Interaction handlers: list, count and clear the repository.

use crate::admin_api::types::*;
use crate::recording::InteractionRepository;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use tracing::{error, info};

/// GET /__mirage/interactions - every interaction, most recent first
pub fn handle_list(repository: &dyn InteractionRepository) -> Response<Full<Bytes>> {
    match repository.find_all() {
        Ok(interactions) => json_response(StatusCode::OK, &interactions),
        Err(e) => {
            error!("Failed to list interactions: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// GET /__mirage/interactions/count
pub fn handle_count(repository: &dyn InteractionRepository) -> Response<Full<Bytes>> {
    match repository.count() {
        Ok(count) => json_response(StatusCode::OK, &CountResponse { count }),
        Err(e) => {
            error!("Failed to count interactions: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// DELETE /__mirage/interactions - reports how many recordings were removed
pub fn handle_clear(repository: &dyn InteractionRepository) -> Response<Full<Bytes>> {
    match repository.clear() {
        Ok(cleared) => {
            info!("Cleared {} recorded interactions", cleared);
            json_response(StatusCode::OK, &ClearedResponse { cleared })
        }
        Err(e) => {
            error!("Failed to clear interactions: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}
