use std::sync::Arc;

use crate::extractor::MetadataExtractor;

/// Shared application state passed to all handlers.
///
/// The extractor (and the cache it owns) is built once at startup and lives
/// for the whole process.
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<MetadataExtractor>,
    /// Target used when a request carries no `url` parameter.
    pub default_target_url: Option<Arc<str>>,
}

impl AppState {
    pub fn new(extractor: MetadataExtractor, default_target_url: Option<String>) -> Self {
        Self {
            extractor: Arc::new(extractor),
            default_target_url: default_target_url.map(Arc::from),
        }
    }
}
