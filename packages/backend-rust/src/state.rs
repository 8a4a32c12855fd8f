use std::sync::Arc;
use std::time::{Instant, SystemTime};

use shuxue_algo::Catalog;

use crate::config::Config;
use crate::services::{ProgressService, SessionRegistry};

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    config: Arc<Config>,
    catalog: Arc<Catalog>,
    progress: Arc<ProgressService>,
    sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(config: Config, catalog: Catalog) -> Self {
        let catalog = Arc::new(catalog);
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            progress: Arc::new(ProgressService::new(Arc::clone(&catalog))),
            sessions: Arc::new(SessionRegistry::with_ttl(config.session_ttl())),
            config: Arc::new(config),
            catalog,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn progress(&self) -> &ProgressService {
        &self.progress
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }
}
