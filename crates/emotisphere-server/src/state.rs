//! Shared application state handed to every handler.

use std::sync::Arc;

use emotisphere_core::{HubHandle, PipelineControl};

/// Everything the handlers need: the hub for new subscribers and the
/// scheduler behind its control trait.
pub struct AppState {
    /// Handle to the broadcast hub.
    pub hub: HubHandle,
    /// Start/stop/status over the pipeline.
    pub control: Arc<dyn PipelineControl>,
    /// Required API keys absent at boot. Non-empty means `/start` is refused.
    pub missing_credentials: Vec<&'static str>,
}

impl AppState {
    /// Bundle the hub and pipeline control.
    pub fn new(
        hub: HubHandle,
        control: Arc<dyn PipelineControl>,
        missing_credentials: Vec<&'static str>,
    ) -> Self {
        Self {
            hub,
            control,
            missing_credentials,
        }
    }
}
