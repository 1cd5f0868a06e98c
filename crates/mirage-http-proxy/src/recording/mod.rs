//! Interaction capture and matching.
//!
//! In record mode requests are forwarded to the real target and the exchange
//! is persisted; in playback mode requests are fingerprinted and answered from
//! the persisted interactions.
//!
//! # Module Structure
//!
//! - `types` - Interaction, request, response and metadata types
//! - `fingerprint` - Deterministic request digest used as the storage key
//! - `store` - Repository contract and filesystem implementation
//! - `player` - Fingerprint-and-lookup playback
//! - `mode` - Record/playback mode and its controller
//!
//! Forwarding for record mode lives in `proxy::forwarding` (`Recorder`).

mod fingerprint;
mod mode;
mod player;
mod store;
mod types;

pub use fingerprint::{fingerprint, Fingerprinter, DEFAULT_IGNORED_HEADERS};
pub use mode::{Mode, ModeController, ParseModeError};
pub use player::{Player, PlayerError};
pub use store::{
    create_repository, sanitize_service_name, FileRepository, InteractionRepository,
    RepositoryError, UNKNOWN_PARTITION,
};
pub use types::{
    header_values, HeaderValues, Interaction, InteractionMetadata, RecordedRequest,
    RecordedResponse,
};
