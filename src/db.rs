use std::str::FromStr;

use anyhow::Context;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use time::{Date, OffsetDateTime};
use tracing::info;

use crate::{
    config::AppConfig,
    records::{repo::RecordStore, repo_types::NewWasteRecord},
};

pub async fn connect(config: &AppConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .with_context(|| format!("parse DATABASE_URL {}", config.database_url))?
        .create_if_missing(true);
    // An in-memory database lives only as long as its connection.
    let db = SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .context("connect to database")?;
    Ok(db)
}

pub async fn migrate(db: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    Ok(())
}

pub fn sample_records(today: Date) -> Vec<NewWasteRecord> {
    [
        ("Escola Municipal Centro", "lunch", 50.0, 45.0),
        ("Colégio Estadual Norte", "breakfast", 30.0, 28.0),
        ("EMEF Sul", "lunch", 40.0, 35.0),
    ]
    .into_iter()
    .map(|(school, meal, prepared, served)| NewWasteRecord {
        school_name: school.into(),
        meal_type: meal.into(),
        food_prepared: prepared,
        food_served: served,
        date: today,
    })
    .collect()
}

/// Inserts the sample records when the store is empty. Returns how many
/// were inserted.
pub async fn seed_if_empty(store: &dyn RecordStore) -> anyhow::Result<usize> {
    if store.count().await? > 0 {
        return Ok(0);
    }
    let samples = sample_records(OffsetDateTime::now_utc().date());
    let n = samples.len();
    for record in samples {
        store.insert(record).await?;
    }
    info!(count = n, "seeded sample waste records");
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::repo::SqliteRecordStore;

    async fn store() -> SqliteRecordStore {
        let db = connect(&AppConfig::in_memory()).await.unwrap();
        migrate(&db).await.unwrap();
        SqliteRecordStore::new(db)
    }

    #[tokio::test]
    async fn seeds_once() {
        let store = store().await;
        assert_eq!(seed_if_empty(&store).await.unwrap(), 3);
        assert_eq!(seed_if_empty(&store).await.unwrap(), 0);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let db = connect(&AppConfig::in_memory()).await.unwrap();
        migrate(&db).await.unwrap();
        migrate(&db).await.unwrap();
    }

    #[test]
    fn sample_data_matches_known_totals() {
        let samples = sample_records(time::macros::date!(2024 - 01 - 15));
        let prepared: f64 = samples.iter().map(|s| s.food_prepared).sum();
        let served: f64 = samples.iter().map(|s| s.food_served).sum();
        assert_eq!(prepared, 120.0);
        assert_eq!(served, 108.0);
    }
}
