//! Admin endpoints served under `/__mirage` on the intermediary listener.
//!
//! - Health and Prometheus metrics
//! - Reading and switching the record/playback mode
//! - Listing, counting and clearing recorded interactions

mod handlers;
mod router;
mod types;

pub use router::{route_request, AdminContext, ADMIN_PREFIX};
pub use types::{
    error_response, json_response, ClearedResponse, CountResponse, ErrorResponse, ModeBody,
    NoRecordingResponse,
};
