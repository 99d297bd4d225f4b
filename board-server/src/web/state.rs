//! Application state for the web layer.

use std::sync::Arc;

use crate::hub::{Hub, UpdateHub, VoiceHub};
use crate::session::SessionConfig;
use crate::store::TimetableStore;

/// Shared application state.
///
/// Owns the hub registries; sessions and the edit path reach them only
/// through here.
#[derive(Clone)]
pub struct AppState {
    /// Timetable store
    pub store: Arc<dyn TimetableStore>,

    /// Display refresh registry
    pub hub: Arc<UpdateHub>,

    /// Voice announcement registry
    pub voice: Arc<VoiceHub>,

    /// Session timing configuration
    pub config: SessionConfig,
}

impl AppState {
    /// Create a new app state with fresh hub registries.
    pub fn new(store: Arc<dyn TimetableStore>, config: SessionConfig) -> Self {
        Self {
            store,
            hub: Arc::new(Hub::new()),
            voice: Arc::new(Hub::new()),
            config,
        }
    }
}
