use anyhow::Context;
use async_trait::async_trait;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::debug;

use crate::records::repo_types::{DeleteOutcome, NewWasteRecord, WasteRecord};

/// Persistence for waste records. Handlers only see this trait.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Stores a new record, assigning `id` and `created_at`.
    async fn insert(&self, record: NewWasteRecord) -> anyhow::Result<WasteRecord>;
    async fn delete(&self, id: i64) -> anyhow::Result<DeleteOutcome>;
    async fn count(&self) -> anyhow::Result<i64>;
    /// Every record in insertion order.
    async fn list_all(&self) -> anyhow::Result<Vec<WasteRecord>>;
    /// Newest `limit` records by date.
    async fn list_recent_descending(&self, limit: i64) -> anyhow::Result<Vec<WasteRecord>>;
    async fn list_all_descending_by_date(&self) -> anyhow::Result<Vec<WasteRecord>>;
}

#[derive(Clone)]
pub struct SqliteRecordStore {
    db: SqlitePool,
}

impl SqliteRecordStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

const COLUMNS: &str = "id, school_name, meal_type, food_prepared, food_served, date, created_at";

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert(&self, record: NewWasteRecord) -> anyhow::Result<WasteRecord> {
        let created_at = OffsetDateTime::now_utc();
        let row = sqlx::query_as::<_, WasteRecord>(&format!(
            r#"
            INSERT INTO waste_records (school_name, meal_type, food_prepared, food_served, date, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&record.school_name)
        .bind(&record.meal_type)
        .bind(record.food_prepared)
        .bind(record.food_served)
        .bind(record.date)
        .bind(created_at)
        .fetch_one(&self.db)
        .await
        .context("insert waste record")?;
        debug!(id = row.id, school = %row.school_name, "waste record inserted");
        Ok(row)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<DeleteOutcome> {
        let res = sqlx::query("DELETE FROM waste_records WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete waste record")?;
        Ok(if res.rows_affected() == 0 {
            DeleteOutcome::NotFound
        } else {
            DeleteOutcome::Deleted
        })
    }

    async fn count(&self) -> anyhow::Result<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM waste_records")
            .fetch_one(&self.db)
            .await
            .context("count waste records")?;
        Ok(n)
    }

    async fn list_all(&self) -> anyhow::Result<Vec<WasteRecord>> {
        let rows = sqlx::query_as::<_, WasteRecord>(&format!(
            "SELECT {COLUMNS} FROM waste_records ORDER BY id ASC"
        ))
        .fetch_all(&self.db)
        .await
        .context("list waste records")?;
        Ok(rows)
    }

    async fn list_recent_descending(&self, limit: i64) -> anyhow::Result<Vec<WasteRecord>> {
        let rows = sqlx::query_as::<_, WasteRecord>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM waste_records
            ORDER BY date DESC, id DESC
            LIMIT ?
            "#
        ))
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .context("list recent waste records")?;
        Ok(rows)
    }

    async fn list_all_descending_by_date(&self) -> anyhow::Result<Vec<WasteRecord>> {
        let rows = sqlx::query_as::<_, WasteRecord>(&format!(
            "SELECT {COLUMNS} FROM waste_records ORDER BY date DESC, id DESC"
        ))
        .fetch_all(&self.db)
        .await
        .context("list waste records by date")?;
        Ok(rows)
    }
}
