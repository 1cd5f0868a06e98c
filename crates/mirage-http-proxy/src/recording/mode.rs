//! Record/playback mode and the shared controller that holds it.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Whether inbound traffic is forwarded and recorded, or answered from recordings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Forward to the real target and persist the exchange
    Record,
    /// Answer from previously recorded interactions, never touching the network
    #[default]
    Playback,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Record => "record",
            Mode::Playback => "playback",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown mode '{0}', expected 'record' or 'playback'")]
pub struct ParseModeError(String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "record" => Ok(Mode::Record),
            "playback" => Ok(Mode::Playback),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

/// Shared handle to the current mode. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct ModeController {
    mode: Arc<RwLock<Mode>>,
}

impl ModeController {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode: Arc::new(RwLock::new(mode)),
        }
    }

    pub fn get(&self) -> Mode {
        *self.mode.read()
    }

    /// Switch mode, returning the previous one.
    pub fn set(&self, mode: Mode) -> Mode {
        let previous = std::mem::replace(&mut *self.mode.write(), mode);
        if previous != mode {
            info!("Mode changed: {} -> {}", previous, mode);
        }
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_default_is_playback() {
        assert_eq!(Mode::default(), Mode::Playback);
        assert_eq!(ModeController::default().get(), Mode::Playback);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("record".parse::<Mode>().unwrap(), Mode::Record);
        assert_eq!(" Playback ".parse::<Mode>().unwrap(), Mode::Playback);
        let err = "replay".parse::<Mode>().unwrap_err();
        assert!(err.to_string().contains("replay"));
    }

    #[test]
    fn test_mode_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Mode::Record).unwrap(), r#""record""#);
        let mode: Mode = serde_json::from_str(r#""playback""#).unwrap();
        assert_eq!(mode, Mode::Playback);
    }

    #[test]
    fn test_controller_set_get() {
        let controller = ModeController::new(Mode::Playback);
        assert_eq!(controller.set(Mode::Record), Mode::Playback);
        assert_eq!(controller.get(), Mode::Record);
    }

    #[test]
    fn test_controller_clones_share_state() {
        let controller = ModeController::new(Mode::Record);
        let other = controller.clone();
        other.set(Mode::Playback);
        assert_eq!(controller.get(), Mode::Playback);
    }
}
