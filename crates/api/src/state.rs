use std::sync::Arc;
use tickerlens_core::DataProvider;

/// Shared application state accessible by all route handlers.
pub struct AppState {
    /// Usually a cached provider; handlers never care which.
    pub provider: Arc<dyn DataProvider>,
}

impl AppState {
    pub fn new(provider: Arc<dyn DataProvider>) -> Self {
        Self { provider }
    }
}
