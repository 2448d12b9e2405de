use std::sync::Arc;

use crate::analysis::export::ReportExporter;
use crate::config::Config;
use crate::jobs::store::JobSource;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable job store. Default: PgJobSource.
    pub jobs: Arc<dyn JobSource>,
    pub exporter: ReportExporter,
    pub config: Config,
}
