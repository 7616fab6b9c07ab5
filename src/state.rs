use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: AppConfig,
}
