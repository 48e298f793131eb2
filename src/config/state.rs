// Application state module
// Shared, read-only state handed to every connection

use std::sync::Arc;

use super::types::Config;
use crate::assets::Assets;

/// Application state
pub struct AppState {
    pub config: Config,
    pub assets: Arc<Assets>,

    // Cached config values for fast access on the request path
    pub access_log: bool,
}

impl AppState {
    pub fn new(config: &Config, assets: Arc<Assets>) -> Self {
        Self {
            access_log: config.logging.access_log,
            config: config.clone(),
            assets,
        }
    }
}
