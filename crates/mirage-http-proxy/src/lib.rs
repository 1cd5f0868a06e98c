//! Mirage: a record/playback HTTP intermediary.
//!
//! In record mode requests are forwarded to the real target named in the
//! request and every exchange is stored on disk, keyed by a fingerprint of the
//! request. In playback mode the same requests are answered from those
//! recordings without touching the network.

pub mod admin_api;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod proxy;
pub mod recording;

mod backends;

pub use backends::InMemoryRepository;
