//! SQLite-Implementierung des RestrictionRepository

use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::models::{jetzt, zeitstempel_text, NeueSperre, SperreRecord};
use crate::repository::{DbResult, RestrictionRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{parse_datetime, parse_uuid};

#[async_trait]
impl RestrictionRepository for SqliteDb {
    async fn is_restricted(&self, sender_email: &str, recipient_email: &str) -> DbResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS (
               SELECT 1 FROM messaging_restrictions
               WHERE sender_email = ? AND recipient_email = ?
             ) AS gesperrt",
        )
        .bind(sender_email)
        .bind(recipient_email)
        .fetch_one(&self.pool)
        .await?;

        let gesperrt: i64 = row.try_get("gesperrt")?;
        Ok(gesperrt != 0)
    }

    async fn insert_restriction(&self, data: NeueSperre<'_>) -> DbResult<SperreRecord> {
        let id = Uuid::new_v4();
        let now = jetzt();

        sqlx::query(
            "INSERT INTO messaging_restrictions
               (id, sender_email, recipient_email, reason, restricted_by, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(data.sender_email)
        .bind(data.recipient_email)
        .bind(data.reason)
        .bind(data.restricted_by)
        .bind(zeitstempel_text(&now))
        .execute(&self.pool)
        .await?;

        tracing::info!(sperre_id = %id, "Nachrichtensperre angelegt");

        Ok(SperreRecord {
            id,
            sender_email: data.sender_email.to_string(),
            recipient_email: data.recipient_email.to_string(),
            reason: data.reason.to_string(),
            restricted_by: data.restricted_by.to_string(),
            created_at: now,
        })
    }

    async fn list_for_sender(&self, sender_email: &str) -> DbResult<Vec<SperreRecord>> {
        let rows = sqlx::query(
            "SELECT id, sender_email, recipient_email, reason, restricted_by, created_at
             FROM messaging_restrictions
             WHERE sender_email = ?
             ORDER BY created_at DESC, rowid DESC",
        )
        .bind(sender_email)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_sperre).collect()
    }
}

fn row_to_sperre(row: &sqlx::sqlite::SqliteRow) -> DbResult<SperreRecord> {
    Ok(SperreRecord {
        id: parse_uuid(row, "id")?,
        sender_email: row.try_get("sender_email")?,
        recipient_email: row.try_get("recipient_email")?,
        reason: row.try_get("reason")?,
        restricted_by: row.try_get("restricted_by")?,
        created_at: parse_datetime(row, "created_at")?,
    })
}
