//! Application state management

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::extraction::ExtractionService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pub config: Config,
    pub extraction: ExtractionService,
    pub db: Option<SqlitePool>,
}

impl AppState {
    /// Create a new application state
    ///
    /// The database pool is optional: the request path never touches it, it is
    /// only held so the HITL schema stays provisioned for the process lifetime.
    pub fn new(config: Config, extraction: ExtractionService, db: Option<SqlitePool>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                extraction,
                db,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the extraction pipeline
    pub fn extraction(&self) -> &ExtractionService {
        &self.inner.extraction
    }

    /// Get the HITL database pool, if configured
    pub fn db(&self) -> Option<&SqlitePool> {
        self.inner.db.as_ref()
    }
}
