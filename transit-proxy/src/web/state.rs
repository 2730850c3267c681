//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::ResponseCache;
use crate::here::HereClient;
use crate::supplemental::ExtraBoards;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// HERE API client
    pub here: Arc<HereClient>,

    /// Station and departure response caches
    pub cache: Arc<ResponseCache>,

    /// Supplemental departures merged into every departure lookup
    pub extra_boards: Arc<ExtraBoards>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(here: HereClient, cache: ResponseCache, extra_boards: ExtraBoards) -> Self {
        Self {
            here: Arc::new(here),
            cache: Arc::new(cache),
            extra_boards: Arc::new(extra_boards),
        }
    }
}
