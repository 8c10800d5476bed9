//! Application state.

use std::sync::Arc;

use webdoctor_core::analyze::Analyzer;

/// State shared across handlers. The analyzer (and the vision client inside
/// it) is built once at startup; requests only read it.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
}

impl AppState {
    pub fn new(analyzer: Arc<Analyzer>) -> Self {
        Self { analyzer }
    }
}
