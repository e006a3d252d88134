use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::orchestrator::CorrectionOrchestrator;
use crate::services::scheduling::SchedulingSystem;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub scheduling: Arc<dyn SchedulingSystem>,
    pub orchestrator: CorrectionOrchestrator,
}
