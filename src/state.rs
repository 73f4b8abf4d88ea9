use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{MessageService, SeaOrmMessageService, SeaOrmUserService, UserService};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub user_service: Arc<dyn UserService>,

    pub message_service: Arc<dyn MessageService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::from_config(&config.general).await?;
        Ok(Self::with_store(config, store))
    }

    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let user_service: Arc<dyn UserService> = Arc::new(SeaOrmUserService::new(
            store.clone(),
            config.security.clone(),
        ));
        let message_service: Arc<dyn MessageService> =
            Arc::new(SeaOrmMessageService::new(store.clone()));

        Self {
            config: Arc::new(config),
            store,
            user_service,
            message_service,
        }
    }
}
