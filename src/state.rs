use crate::config::AppConfig;
use crate::db;
use crate::records::repo::{RecordStore, SqliteRecordStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
}

impl AppState {
    /// Connects, migrates and seeds. Runs once before the server starts.
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let db = db::connect(config).await?;
        db::migrate(&db).await?;

        let store = Arc::new(SqliteRecordStore::new(db)) as Arc<dyn RecordStore>;
        if config.seed_sample_data {
            db::seed_if_empty(store.as_ref()).await?;
        }

        Ok(Self::from_parts(store))
    }

    pub fn from_parts(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    #[cfg(test)]
    pub async fn fake() -> Self {
        Self::init(&AppConfig::in_memory())
            .await
            .expect("in-memory state")
    }
}
