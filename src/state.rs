use std::sync::Arc;

use crate::config::Config;
use crate::db::history::HistoryStore;
use crate::error::ApiError;
use crate::fetch::RateService;

/// Shared application state, passed to all route handlers via
/// `axum::extract::State` and to the scheduled job.
pub struct AppState {
    pub config: Config,
    pub rates: RateService,
    pub store: HistoryStore,
}

impl AppState {
    /// Open the history store (failing startup if the database path is
    /// unusable) and build both upstream clients.
    pub fn new(config: Config) -> Result<Arc<Self>, ApiError> {
        let store = HistoryStore::open(&config.db_path)?;
        let rates = RateService::new(&config);
        Ok(Arc::new(Self {
            config,
            rates,
            store,
        }))
    }
}
