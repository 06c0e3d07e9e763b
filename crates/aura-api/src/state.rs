//! Application state.

use std::sync::Arc;

use aura_storage::LocalStore;
use aura_worker::{BriefingConfig, BriefingProviders, BriefingService, GeminiConfig, ProgressTracker};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub briefing: BriefingService,
    pub progress: ProgressTracker,
}

impl AppState {
    /// Create new application state backed by the local store and Gemini.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let store = Arc::new(LocalStore::open(config.data_dir.clone()).await?);
        let providers = BriefingProviders::gemini(GeminiConfig::from_env())?;
        let progress = ProgressTracker::new();

        let briefing = BriefingService::new(
            BriefingConfig::from_env(),
            store.clone(),
            store,
            providers,
            progress.clone(),
        );

        Ok(Self {
            config,
            briefing,
            progress,
        })
    }

    /// State around an already built service; shares its progress tracker.
    pub fn with_service(config: ApiConfig, briefing: BriefingService) -> Self {
        Self {
            progress: briefing.tracker().clone(),
            config,
            briefing,
        }
    }
}
