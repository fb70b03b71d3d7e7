use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::ai::chain::ProviderChain;
use crate::services::conversation::ConversationEngine;
use crate::services::sessions::SqliteSessionStore;

pub struct AppState {
    pub config: AppConfig,
    pub engine: ConversationEngine,
    pub chain: Arc<ProviderChain>,
    pub store: Arc<SqliteSessionStore>,
}
