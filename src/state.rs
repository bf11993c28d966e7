use std::sync::Arc;

use crate::{
    auth::jwt::JwtService,
    clock::Clock,
    config::AppConfig,
    directory::RecipientDirectory,
    meetings::MeetingsClient,
    notifications::EmergencyScheduler,
    store::RecordStore,
    summary::DocumentSummarizer,
    tracking::TrackingStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn RecordStore>,
    pub tracking: TrackingStore,
    pub directory: Arc<RecipientDirectory>,
    pub clock: Arc<dyn Clock>,
    pub scheduler: Arc<EmergencyScheduler>,
    pub summarizer: DocumentSummarizer,
    pub meetings: MeetingsClient,
    pub jwt: JwtService,
}

/// Everything [`AppState`] is assembled from. Each piece is built by the
/// caller so tests can swap in fakes.
pub struct AppParts {
    pub config: AppConfig,
    pub store: Arc<dyn RecordStore>,
    pub directory: RecipientDirectory,
    pub clock: Arc<dyn Clock>,
    pub scheduler: EmergencyScheduler,
    pub summarizer: DocumentSummarizer,
    pub meetings: MeetingsClient,
    pub jwt: JwtService,
}

impl AppState {
    pub fn new(parts: AppParts) -> Self {
        Self {
            tracking: TrackingStore::new(parts.store.clone()),
            config: Arc::new(parts.config),
            store: parts.store,
            directory: Arc::new(parts.directory),
            clock: parts.clock,
            scheduler: Arc::new(parts.scheduler),
            summarizer: parts.summarizer,
            meetings: parts.meetings,
            jwt: parts.jwt,
        }
    }
}
