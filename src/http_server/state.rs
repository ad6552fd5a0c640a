//! Router state shared by every handler.

use std::sync::Arc;

use crate::observability::MetricsRegistry;
use crate::store::PopulationStore;

/// Handles built once at startup and cloned into each request
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PopulationStore>,
    pub metrics: Arc<MetricsRegistry>,
    pub problem_base_uri: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<dyn PopulationStore>, problem_base_uri: &str) -> Self {
        Self {
            store,
            metrics: Arc::new(MetricsRegistry::new()),
            problem_base_uri: Arc::from(problem_base_uri),
        }
    }
}
