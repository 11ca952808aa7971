use std::sync::Arc;

use crate::{config::Config, database::Database, notifications::Notifier};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub notifier: Notifier,
}
