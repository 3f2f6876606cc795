use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::Db;
use crate::mailer::{LogMailer, Mailer};
use crate::storage::{LocalStorage, StorageClient, AVATARS_URL_PREFIX};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Db>,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let storage =
            Arc::new(LocalStorage::new(&config.avatars_dir, AVATARS_URL_PREFIX).await?)
                as Arc<dyn StorageClient>;

        Ok(Self::from_parts(
            Arc::new(Db::new()),
            Arc::new(config),
            storage,
            Arc::new(LogMailer),
        ))
    }

    pub fn from_parts(
        db: Arc<Db>,
        config: Arc<AppConfig>,
        storage: Arc<dyn StorageClient>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            db,
            config,
            storage,
            mailer,
        }
    }
}

#[cfg(test)]
pub use fake::Fakes;
