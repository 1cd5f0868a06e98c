use super::forwarding::Recorder;
use crate::recording::{InteractionRepository, ModeController, Player};
use std::sync::Arc;

/// Context for handling a request, containing all necessary state.
pub struct RequestHandlerContext<'a> {
    pub mode: &'a ModeController,
    pub recorder: &'a Recorder,
    pub player: &'a Player,
    pub repository: &'a Arc<dyn InteractionRepository>,
    /// Query parameter carrying the upstream target
    pub target_param: &'a str,
}
